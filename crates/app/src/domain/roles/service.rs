//! Roles service.

use async_trait::async_trait;
use mockall::automock;
use serde_json::json;
use tracing::info;

use crate::{
    auth::{Claims, Permissions},
    database::Db,
    domain::{
        audit::{
            PgAuditRepository,
            data::{AuditAction, NewAuditEntry},
        },
        roles::{
            data::{NewRole, RoleUpdate, first_invalid_permission},
            errors::RolesServiceError,
            records::{RoleRecord, RoleUuid},
            repository::PgRolesRepository,
        },
    },
    pagination::{Page, PageRequest},
};

#[derive(Debug, Clone)]
pub struct PgRolesService {
    db: Db,
    repository: PgRolesRepository,
    audit: PgAuditRepository,
}

impl PgRolesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgRolesRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }
}

fn check_grant(claims: &Claims, permissions: &Permissions) -> Result<(), RolesServiceError> {
    if let Some(invalid) = first_invalid_permission(permissions) {
        return Err(RolesServiceError::InvalidPermission(invalid));
    }

    if !claims.permissions.covers(permissions) {
        return Err(RolesServiceError::EscalatesPrivileges);
    }

    Ok(())
}

#[async_trait]
impl RolesService for PgRolesService {
    #[tracing::instrument(
        name = "roles.service.create_role",
        skip(self, claims, role),
        fields(tenant_uuid = %claims.tenant),
        err
    )]
    async fn create_role(
        &self,
        claims: &Claims,
        role: NewRole,
    ) -> Result<RoleRecord, RolesServiceError> {
        check_grant(claims, &role.permissions)?;

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let created = self.repository.create_role(&mut tx, claims.tenant, role).await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::RoleCreate, created.uuid)
                    .with_metadata(json!({ "name": created.name })),
            )
            .await?;

        tx.commit().await?;

        info!(role_uuid = %created.uuid, "created role");

        Ok(created)
    }

    async fn get_role(&self, claims: &Claims, role: RoleUuid) -> Result<RoleRecord, RolesServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let role = self.repository.get_role(&mut tx, claims.tenant, role).await?;

        tx.commit().await?;

        Ok(role)
    }

    async fn list_roles(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<RoleRecord>, RolesServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let (roles, total) = self.repository.list_roles(&mut tx, claims.tenant, &page).await?;

        tx.commit().await?;

        Ok(Page::new(roles, &page, total))
    }

    #[tracing::instrument(
        name = "roles.service.update_role",
        skip(self, claims, update),
        fields(tenant_uuid = %claims.tenant, role_uuid = %role),
        err
    )]
    async fn update_role(
        &self,
        claims: &Claims,
        role: RoleUuid,
        update: RoleUpdate,
    ) -> Result<RoleRecord, RolesServiceError> {
        if let Some(permissions) = &update.permissions {
            check_grant(claims, permissions)?;
        }

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let updated = self
            .repository
            .update_role(&mut tx, claims.tenant, role, update)
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::RoleUpdate, role).with_metadata(json!({
                    "name": updated.name,
                    "permissions": updated.permissions,
                })),
            )
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "roles.service.delete_role",
        skip(self, claims),
        fields(tenant_uuid = %claims.tenant, role_uuid = %role),
        err
    )]
    async fn delete_role(&self, claims: &Claims, role: RoleUuid) -> Result<(), RolesServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let rows_affected = self.repository.delete_role(&mut tx, claims.tenant, role).await?;

        if rows_affected == 0 {
            return Err(RolesServiceError::NotFound);
        }

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::RoleDelete, role),
            )
            .await?;

        tx.commit().await?;

        info!(role_uuid = %role, "deleted role");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait RolesService: Send + Sync {
    /// Creates a role in the caller's tenant.
    async fn create_role(&self, claims: &Claims, role: NewRole)
    -> Result<RoleRecord, RolesServiceError>;

    async fn get_role(&self, claims: &Claims, role: RoleUuid) -> Result<RoleRecord, RolesServiceError>;

    async fn list_roles(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<RoleRecord>, RolesServiceError>;

    /// Renames a role or replaces its permission set.
    async fn update_role(
        &self,
        claims: &Claims,
        role: RoleUuid,
        update: RoleUpdate,
    ) -> Result<RoleRecord, RolesServiceError>;

    /// Deletes a role and detaches it from every user.
    async fn delete_role(&self, claims: &Claims, role: RoleUuid) -> Result<(), RolesServiceError>;
}
