//! Database instances service.

use async_trait::async_trait;
use mockall::automock;
use serde_json::json;
use tracing::info;

use crate::{
    auth::Claims,
    database::Db,
    domain::{
        audit::{
            PgAuditRepository,
            data::{AuditAction, NewAuditEntry},
        },
        databases::{
            data::{NewDatabase, StatusUpdate},
            errors::DatabasesServiceError,
            records::{DatabaseRecord, DatabaseStatus, DatabaseUuid, SizeClass},
            repository::{DatabaseChanges, PgDatabasesRepository},
        },
    },
    pagination::{Page, PageRequest},
};

#[derive(Debug, Clone)]
pub struct PgDatabasesService {
    db: Db,
    repository: PgDatabasesRepository,
    audit: PgAuditRepository,
}

impl PgDatabasesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgDatabasesRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }
}

fn check_transition(from: DatabaseStatus, to: DatabaseStatus) -> Result<(), DatabasesServiceError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(DatabasesServiceError::InvalidTransition { from, to })
    }
}

#[async_trait]
impl DatabasesService for PgDatabasesService {
    #[tracing::instrument(
        name = "databases.service.provision_database",
        skip(self, claims, database),
        fields(tenant_uuid = %claims.tenant),
        err
    )]
    async fn provision_database(
        &self,
        claims: &Claims,
        database: NewDatabase,
    ) -> Result<DatabaseRecord, DatabasesServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let created = self
            .repository
            .create_database(&mut tx, claims.tenant, database)
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::DatabaseProvision, created.uuid)
                    .with_metadata(json!({
                        "name": created.name,
                        "engine": created.engine.as_str(),
                        "size_class": created.size_class.as_str(),
                    })),
            )
            .await?;

        tx.commit().await?;

        info!(database_uuid = %created.uuid, engine = %created.engine, "provisioning database");

        Ok(created)
    }

    async fn get_database(
        &self,
        claims: &Claims,
        database: DatabaseUuid,
    ) -> Result<DatabaseRecord, DatabasesServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let database = self
            .repository
            .get_database(&mut tx, claims.tenant, database)
            .await?;

        tx.commit().await?;

        Ok(database)
    }

    async fn list_databases(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<DatabaseRecord>, DatabasesServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let (databases, total) = self
            .repository
            .list_databases(&mut tx, claims.tenant, &page)
            .await?;

        tx.commit().await?;

        Ok(Page::new(databases, &page, total))
    }

    #[tracing::instrument(
        name = "databases.service.scale_database",
        skip(self, claims),
        fields(tenant_uuid = %claims.tenant, database_uuid = %database),
        err
    )]
    async fn scale_database(
        &self,
        claims: &Claims,
        database: DatabaseUuid,
        size_class: SizeClass,
    ) -> Result<DatabaseRecord, DatabasesServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let current = self
            .repository
            .lock_database(&mut tx, claims.tenant, database)
            .await?;

        check_transition(current.status, DatabaseStatus::Scaling)?;

        let scaled = self
            .repository
            .update_database(
                &mut tx,
                claims.tenant,
                database,
                DatabaseChanges {
                    status: DatabaseStatus::Scaling,
                    size_class: Some(size_class),
                    connection: None,
                },
            )
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::DatabaseScale, database).with_metadata(
                    json!({
                        "from": current.size_class.as_str(),
                        "to": size_class.as_str(),
                    }),
                ),
            )
            .await?;

        tx.commit().await?;

        Ok(scaled)
    }

    #[tracing::instrument(
        name = "databases.service.update_database_status",
        skip(self, claims, update),
        fields(tenant_uuid = %claims.tenant, database_uuid = %database, status = %update.status),
        err
    )]
    async fn update_database_status(
        &self,
        claims: &Claims,
        database: DatabaseUuid,
        update: StatusUpdate,
    ) -> Result<DatabaseRecord, DatabasesServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let current = self
            .repository
            .lock_database(&mut tx, claims.tenant, database)
            .await?;

        check_transition(current.status, update.status)?;

        let connection = update
            .connection
            .as_ref()
            .filter(|_| update.status == DatabaseStatus::Ready);

        let updated = self
            .repository
            .update_database(
                &mut tx,
                claims.tenant,
                database,
                DatabaseChanges {
                    status: update.status,
                    size_class: None,
                    connection,
                },
            )
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::DatabaseStatus, database).with_metadata(
                    json!({
                        "from": current.status.as_str(),
                        "to": update.status.as_str(),
                    }),
                ),
            )
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "databases.service.delete_database",
        skip(self, claims),
        fields(tenant_uuid = %claims.tenant, database_uuid = %database),
        err
    )]
    async fn delete_database(
        &self,
        claims: &Claims,
        database: DatabaseUuid,
    ) -> Result<(), DatabasesServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let current = self
            .repository
            .lock_database(&mut tx, claims.tenant, database)
            .await?;

        check_transition(current.status, DatabaseStatus::Deleted)?;

        self.repository
            .update_database(
                &mut tx,
                claims.tenant,
                database,
                DatabaseChanges {
                    status: DatabaseStatus::Deleted,
                    size_class: None,
                    connection: None,
                },
            )
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::DatabaseDelete, database)
                    .with_metadata(json!({ "name": current.name })),
            )
            .await?;

        tx.commit().await?;

        info!(database_uuid = %database, "deleted database");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait DatabasesService: Send + Sync {
    /// Records a new instance in `provisioning`.
    async fn provision_database(
        &self,
        claims: &Claims,
        database: NewDatabase,
    ) -> Result<DatabaseRecord, DatabasesServiceError>;

    async fn get_database(
        &self,
        claims: &Claims,
        database: DatabaseUuid,
    ) -> Result<DatabaseRecord, DatabasesServiceError>;

    async fn list_databases(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<DatabaseRecord>, DatabasesServiceError>;

    /// Moves a ready instance to `scaling` at the new size.
    async fn scale_database(
        &self,
        claims: &Claims,
        database: DatabaseUuid,
        size_class: SizeClass,
    ) -> Result<DatabaseRecord, DatabasesServiceError>;

    /// Applies a lifecycle report; connection details are kept only on `ready`.
    async fn update_database_status(
        &self,
        claims: &Claims,
        database: DatabaseUuid,
        update: StatusUpdate,
    ) -> Result<DatabaseRecord, DatabasesServiceError>;

    async fn delete_database(
        &self,
        claims: &Claims,
        database: DatabaseUuid,
    ) -> Result<(), DatabasesServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::databases::{data::ConnectionInfo, records::DatabaseEngine},
        test::TestContext,
    };

    use super::*;

    fn orders_db() -> NewDatabase {
        NewDatabase {
            name: "orders".to_string(),
            engine: DatabaseEngine::Postgres,
            size_class: SizeClass::Small,
        }
    }

    fn ready() -> StatusUpdate {
        StatusUpdate {
            status: DatabaseStatus::Ready,
            connection: Some(ConnectionInfo {
                host: "db.internal".to_string(),
                port: 5432,
                database: "orders".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn provisioned_database_becomes_ready_with_connection() -> TestResult {
        let ctx = TestContext::new().await;

        let created = ctx.databases.provision_database(&ctx.claims, orders_db()).await?;

        assert_eq!(created.status, DatabaseStatus::Provisioning);
        assert!(created.host.is_none());

        let updated = ctx
            .databases
            .update_database_status(&ctx.claims, created.uuid, ready())
            .await?;

        assert_eq!(updated.status, DatabaseStatus::Ready);
        assert_eq!(updated.host.as_deref(), Some("db.internal"));
        assert_eq!(updated.port, Some(5432));

        Ok(())
    }

    #[tokio::test]
    async fn scaling_requires_ready() -> TestResult {
        let ctx = TestContext::new().await;

        let created = ctx.databases.provision_database(&ctx.claims, orders_db()).await?;

        let early = ctx
            .databases
            .scale_database(&ctx.claims, created.uuid, SizeClass::Large)
            .await;

        assert!(matches!(
            early,
            Err(DatabasesServiceError::InvalidTransition {
                from: DatabaseStatus::Provisioning,
                to: DatabaseStatus::Scaling,
            })
        ));

        ctx.databases
            .update_database_status(&ctx.claims, created.uuid, ready())
            .await?;

        let scaled = ctx
            .databases
            .scale_database(&ctx.claims, created.uuid, SizeClass::Large)
            .await?;

        assert_eq!(scaled.status, DatabaseStatus::Scaling);
        assert_eq!(scaled.size_class, SizeClass::Large);

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_live_name_conflicts() -> TestResult {
        let ctx = TestContext::new().await;

        let first = ctx.databases.provision_database(&ctx.claims, orders_db()).await?;

        let duplicate = ctx.databases.provision_database(&ctx.claims, orders_db()).await;

        assert!(matches!(duplicate, Err(DatabasesServiceError::AlreadyExists)));

        ctx.databases.delete_database(&ctx.claims, first.uuid).await?;
        ctx.databases.provision_database(&ctx.claims, orders_db()).await?;

        Ok(())
    }

    #[tokio::test]
    async fn deleted_database_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        let created = ctx.databases.provision_database(&ctx.claims, orders_db()).await?;

        ctx.databases.delete_database(&ctx.claims, created.uuid).await?;

        let result = ctx.databases.get_database(&ctx.claims, created.uuid).await;

        assert!(matches!(result, Err(DatabasesServiceError::NotFound)));

        let page = ctx
            .databases
            .list_databases(&ctx.claims, PageRequest::default())
            .await?;

        assert_eq!(page.total, 0);

        Ok(())
    }
}
