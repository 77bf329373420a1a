//! Tenants service.

use async_trait::async_trait;
use mockall::automock;
use serde_json::json;
use tracing::info;

use crate::{
    auth::{Claims, PasswordPolicy, Permissions, hash_password_blocking},
    database::Db,
    domain::{
        api_keys::PgApiKeysRepository,
        audit::{
            PgAuditRepository,
            data::{AuditAction, NewAuditEntry},
        },
        databases::PgDatabasesRepository,
        roles::{PgRolesRepository, data::NewRole},
        subscriptions::PgSubscriptionsRepository,
        tenants::{
            data::{NewRegistration, NewTenant, Registration, TenantDeletion, TenantUpdate},
            errors::TenantsServiceError,
            records::{TenantRecord, TenantStatus, TenantUuid},
            repository::PgTenantsRepository,
        },
        users::{PgUsersRepository, UserRow, data::normalize_email, records::UserUuid},
    },
    pagination::{Page, PageRequest},
};

/// Name of the role granted to a tenant's first user.
pub const ADMIN_ROLE_NAME: &str = "admin";

#[derive(Debug, Clone)]
pub struct PgTenantsService {
    db: Db,
    policy: PasswordPolicy,
    repository: PgTenantsRepository,
    users: PgUsersRepository,
    roles: PgRolesRepository,
    api_keys: PgApiKeysRepository,
    databases: PgDatabasesRepository,
    subscriptions: PgSubscriptionsRepository,
    audit: PgAuditRepository,
}

impl PgTenantsService {
    #[must_use]
    pub fn new(db: Db, policy: PasswordPolicy) -> Self {
        Self {
            db,
            policy,
            repository: PgTenantsRepository::new(),
            users: PgUsersRepository::new(),
            roles: PgRolesRepository::new(),
            api_keys: PgApiKeysRepository::new(),
            databases: PgDatabasesRepository::new(),
            subscriptions: PgSubscriptionsRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }
}

/// Callers only ever see their own tenant.
fn ensure_own(claims: &Claims, tenant: TenantUuid) -> Result<(), TenantsServiceError> {
    if claims.tenant == tenant {
        Ok(())
    } else {
        Err(TenantsServiceError::NotFound)
    }
}

#[async_trait]
impl TenantsService for PgTenantsService {
    #[tracing::instrument(
        name = "tenants.service.register",
        skip(self, registration),
        fields(tenant_uuid = tracing::field::Empty),
        err
    )]
    async fn register(
        &self,
        registration: NewRegistration,
    ) -> Result<Registration, TenantsServiceError> {
        let email =
            normalize_email(&registration.email).ok_or(TenantsServiceError::InvalidEmail)?;

        self.policy.check(&registration.password)?;

        let password_hash = hash_password_blocking(registration.password).await?;

        let tenant_uuid = TenantUuid::new();
        let user_uuid = UserUuid::new();
        let permissions: Permissions = ["*"].into_iter().collect();

        tracing::Span::current().record("tenant_uuid", tracing::field::display(tenant_uuid));

        let mut tx = self.db.begin_tenant_transaction(tenant_uuid).await?;

        let tenant = self
            .repository
            .create_tenant(
                &mut tx,
                tenant_uuid,
                NewTenant {
                    name: registration.tenant_name,
                },
            )
            .await?;

        let role = self
            .roles
            .create_role(
                &mut tx,
                tenant_uuid,
                NewRole {
                    name: ADMIN_ROLE_NAME.to_string(),
                    permissions: permissions.clone(),
                },
            )
            .await?;

        self.users
            .create_user(
                &mut tx,
                tenant_uuid,
                UserRow {
                    uuid: user_uuid,
                    email: &email,
                    password_hash: &password_hash,
                    display_name: registration.display_name.trim(),
                },
            )
            .await?;

        self.users
            .set_roles(&mut tx, tenant_uuid, user_uuid, &[role.uuid])
            .await?;

        let entries = [
            NewAuditEntry::system(AuditAction::TenantCreate, tenant_uuid)
                .with_metadata(json!({ "name": tenant.name, "registration": true })),
            NewAuditEntry::system(AuditAction::RoleCreate, role.uuid)
                .with_metadata(json!({ "name": role.name })),
            NewAuditEntry::system(AuditAction::UserCreate, user_uuid)
                .with_metadata(json!({ "email": email })),
        ];

        for entry in entries {
            let entry = NewAuditEntry {
                actor: Some(user_uuid),
                ..entry
            };

            self.audit.record(&mut tx, tenant_uuid, entry).await?;
        }

        let user = self.users.get_user(&mut tx, tenant_uuid, user_uuid).await?;

        tx.commit().await?;

        info!(tenant_uuid = %tenant_uuid, user_uuid = %user_uuid, "registered tenant");

        Ok(Registration {
            tenant,
            role,
            user,
            permissions,
        })
    }

    #[tracing::instrument(
        name = "tenants.service.create_tenant",
        skip(self, claims, tenant),
        fields(tenant_uuid = tracing::field::Empty),
        err
    )]
    async fn create_tenant(
        &self,
        claims: &Claims,
        tenant: NewTenant,
    ) -> Result<TenantRecord, TenantsServiceError> {
        let uuid = TenantUuid::new();

        tracing::Span::current().record("tenant_uuid", tracing::field::display(uuid));

        let mut tx = self.db.begin_tenant_transaction(uuid).await?;

        let created = self.repository.create_tenant(&mut tx, uuid, tenant).await?;

        self.audit
            .record(
                &mut tx,
                uuid,
                NewAuditEntry::by(claims, AuditAction::TenantCreate, uuid).with_metadata(json!({
                    "name": created.name,
                    "created_from": claims.tenant.into_uuid(),
                })),
            )
            .await?;

        tx.commit().await?;

        info!(tenant_uuid = %uuid, "created tenant");

        Ok(created)
    }

    async fn get_tenant(
        &self,
        claims: &Claims,
        tenant: TenantUuid,
    ) -> Result<TenantRecord, TenantsServiceError> {
        ensure_own(claims, tenant)?;

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let tenant = self.repository.get_tenant(&mut tx, tenant).await?;

        tx.commit().await?;

        Ok(tenant)
    }

    async fn list_tenants(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<TenantRecord>, TenantsServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let tenant = self.repository.get_tenant(&mut tx, claims.tenant).await?;

        tx.commit().await?;

        let matches = page.search.as_ref().is_none_or(|term| {
            tenant
                .name
                .to_lowercase()
                .contains(&term.to_lowercase())
        });

        let total = i64::from(matches);
        let items = if matches && page.offset() == 0 {
            vec![tenant]
        } else {
            Vec::new()
        };

        Ok(Page::new(items, &page, total))
    }

    #[tracing::instrument(
        name = "tenants.service.update_tenant",
        skip(self, claims, update),
        fields(tenant_uuid = %tenant),
        err
    )]
    async fn update_tenant(
        &self,
        claims: &Claims,
        tenant: TenantUuid,
        update: TenantUpdate,
    ) -> Result<TenantRecord, TenantsServiceError> {
        ensure_own(claims, tenant)?;

        if update.status == Some(TenantStatus::Deleted) {
            return Err(TenantsServiceError::InvalidTransition);
        }

        let metadata = json!({
            "name": update.name.as_deref().map(str::trim),
            "status": update.status.map(TenantStatus::as_str),
        });

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        let updated = self.repository.update_tenant(&mut tx, tenant, update).await?;

        self.audit
            .record(
                &mut tx,
                tenant,
                NewAuditEntry::by(claims, AuditAction::TenantUpdate, tenant).with_metadata(metadata),
            )
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "tenants.service.delete_tenant",
        skip(self, claims),
        fields(tenant_uuid = %tenant),
        err
    )]
    async fn delete_tenant(
        &self,
        claims: &Claims,
        tenant: TenantUuid,
    ) -> Result<TenantDeletion, TenantsServiceError> {
        ensure_own(claims, tenant)?;

        let mut tx = self.db.begin_tenant_transaction(tenant).await?;

        if self.repository.delete_tenant(&mut tx, tenant).await? == 0 {
            return Err(TenantsServiceError::NotFound);
        }

        let deletion = TenantDeletion {
            users: self.users.delete_tenant_users(&mut tx, tenant).await?,
            api_keys: self.api_keys.revoke_tenant_keys(&mut tx, tenant).await?,
            databases: self.databases.delete_tenant_databases(&mut tx, tenant).await?,
            subscriptions: self.subscriptions.cancel_active(&mut tx, tenant).await?,
        };

        self.audit
            .record(
                &mut tx,
                tenant,
                NewAuditEntry::by(claims, AuditAction::TenantDelete, tenant).with_metadata(json!({
                    "users": deletion.users,
                    "api_keys": deletion.api_keys,
                    "databases": deletion.databases,
                    "subscriptions": deletion.subscriptions,
                })),
            )
            .await?;

        tx.commit().await?;

        info!(?deletion, "deleted tenant");

        Ok(deletion)
    }
}

#[automock]
#[async_trait]
pub trait TenantsService: Send + Sync {
    /// Self-service signup: creates a tenant, its `admin` role and first user.
    async fn register(
        &self,
        registration: NewRegistration,
    ) -> Result<Registration, TenantsServiceError>;

    /// Creates an empty tenant.
    async fn create_tenant(
        &self,
        claims: &Claims,
        tenant: NewTenant,
    ) -> Result<TenantRecord, TenantsServiceError>;

    async fn get_tenant(
        &self,
        claims: &Claims,
        tenant: TenantUuid,
    ) -> Result<TenantRecord, TenantsServiceError>;

    /// Lists the tenants visible to the caller, which is only their own.
    async fn list_tenants(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<TenantRecord>, TenantsServiceError>;

    async fn update_tenant(
        &self,
        claims: &Claims,
        tenant: TenantUuid,
        update: TenantUpdate,
    ) -> Result<TenantRecord, TenantsServiceError>;

    /// Soft-deletes the tenant and everything that hangs off it.
    async fn delete_tenant(
        &self,
        claims: &Claims,
        tenant: TenantUuid,
    ) -> Result<TenantDeletion, TenantsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::users::{UsersService, UsersServiceError, data::Credentials},
        test::{TestContext, helpers::TEST_PASSWORD},
    };

    use super::*;

    #[tokio::test]
    async fn register_creates_admin_with_wildcard() -> TestResult {
        let ctx = TestContext::new().await;

        let registration = ctx
            .tenants
            .register(NewRegistration {
                tenant_name: "  Acme  ".to_string(),
                email: "Founder@Acme.Example".to_string(),
                password: TEST_PASSWORD.to_string(),
                display_name: "Founder".to_string(),
            })
            .await?;

        assert_eq!(registration.tenant.name, "Acme");
        assert_eq!(registration.role.name, ADMIN_ROLE_NAME);
        assert!(registration.permissions.is_wildcard());
        assert_eq!(registration.user.email, "founder@acme.example");
        assert_eq!(registration.user.roles, vec![registration.role.uuid]);

        Ok(())
    }

    #[tokio::test]
    async fn register_with_weak_password_creates_nothing() {
        let ctx = TestContext::new().await;

        let result = ctx
            .tenants
            .register(NewRegistration {
                tenant_name: "Acme".to_string(),
                email: "founder@acme.example".to_string(),
                password: "password".to_string(),
                display_name: String::new(),
            })
            .await;

        assert!(matches!(result, Err(TenantsServiceError::WeakPassword(_))));
    }

    #[tokio::test]
    async fn other_tenant_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let other = ctx.register_tenant("Other", "owner@other.example").await;

        let result = ctx.tenants.get_tenant(&ctx.claims, other.tenant).await;

        assert!(matches!(result, Err(TenantsServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn list_tenants_returns_only_own_tenant() -> TestResult {
        let ctx = TestContext::new().await;
        ctx.register_tenant("Other", "owner@other.example").await;

        let page = ctx
            .tenants
            .list_tenants(&ctx.claims, PageRequest::default())
            .await?;

        assert_eq!(page.total, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items.first().map(|t| t.uuid), Some(ctx.tenant));

        Ok(())
    }

    #[tokio::test]
    async fn update_tenant_renames_and_suspends() -> TestResult {
        let ctx = TestContext::new().await;

        let updated = ctx
            .tenants
            .update_tenant(
                &ctx.claims,
                ctx.tenant,
                TenantUpdate {
                    name: Some("Renamed".to_string()),
                    status: Some(TenantStatus::Suspended),
                },
            )
            .await?;

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.status, TenantStatus::Suspended);

        Ok(())
    }

    #[tokio::test]
    async fn update_to_deleted_is_an_invalid_transition() {
        let ctx = TestContext::new().await;

        let result = ctx
            .tenants
            .update_tenant(
                &ctx.claims,
                ctx.tenant,
                TenantUpdate {
                    status: Some(TenantStatus::Deleted),
                    ..TenantUpdate::default()
                },
            )
            .await;

        assert!(matches!(result, Err(TenantsServiceError::InvalidTransition)));
    }

    #[tokio::test]
    async fn delete_tenant_cascades_and_blocks_login() -> TestResult {
        let ctx = TestContext::new().await;

        let deletion = ctx.tenants.delete_tenant(&ctx.claims, ctx.tenant).await?;

        assert_eq!(deletion.users, 1);

        let login = ctx
            .users
            .authenticate(Credentials {
                email: ctx.claims.email.clone(),
                password: TEST_PASSWORD.to_string(),
                tenant: None,
            })
            .await;

        assert!(matches!(login, Err(UsersServiceError::InvalidCredentials)));

        let again = ctx.tenants.delete_tenant(&ctx.claims, ctx.tenant).await;

        assert!(matches!(again, Err(TenantsServiceError::NotFound)));

        Ok(())
    }
}
