//! Users service.

use async_trait::async_trait;
use mockall::automock;
use serde_json::json;
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::{
    auth::{
        Claims, PasswordPolicy, hash_password_blocking, verify_password_blocking,
    },
    database::Db,
    domain::{
        audit::{
            PgAuditRepository,
            data::{AuditAction, NewAuditEntry},
        },
        roles::{PgRolesRepository, records::RoleUuid},
        tenants::records::TenantStatus,
        users::{
            data::{
                AuthenticatedUser, Credentials, NewUser, UserUpdate, dedup_roles, normalize_email,
            },
            errors::UsersServiceError,
            records::{UserRecord, UserStatus, UserUuid},
            repository::{PgUsersRepository, UserChanges, UserRow},
        },
    },
    pagination::{Page, PageRequest},
};

#[derive(Debug, Clone)]
pub struct PgUsersService {
    db: Db,
    policy: PasswordPolicy,
    repository: PgUsersRepository,
    roles: PgRolesRepository,
    audit: PgAuditRepository,
}

impl PgUsersService {
    #[must_use]
    pub fn new(db: Db, policy: PasswordPolicy) -> Self {
        Self {
            db,
            policy,
            repository: PgUsersRepository::new(),
            roles: PgRolesRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }

    /// Check that every role exists in the caller's tenant and grants nothing
    /// the caller lacks.
    async fn check_roles(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        claims: &Claims,
        roles: &[RoleUuid],
    ) -> Result<Vec<RoleUuid>, UsersServiceError> {
        let roles = dedup_roles(roles);

        if roles.is_empty() {
            return Ok(roles);
        }

        let found = self.roles.count_matching(tx, claims.tenant, &roles).await?;

        if usize::try_from(found).ok() != Some(roles.len()) {
            return Err(UsersServiceError::InvalidRole);
        }

        let granted = self.roles.permissions_of(tx, claims.tenant, &roles).await?;

        if !claims.permissions.covers(&granted) {
            return Err(UsersServiceError::EscalatesPrivileges);
        }

        Ok(roles)
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    #[tracing::instrument(
        name = "users.service.create_user",
        skip(self, claims, user),
        fields(tenant_uuid = %claims.tenant, user_uuid = tracing::field::Empty),
        err
    )]
    async fn create_user(
        &self,
        claims: &Claims,
        user: NewUser,
    ) -> Result<UserRecord, UsersServiceError> {
        let email = normalize_email(&user.email).ok_or(UsersServiceError::InvalidEmail)?;

        self.policy.check(&user.password)?;

        let password_hash = hash_password_blocking(user.password).await?;
        let uuid = UserUuid::new();

        tracing::Span::current().record("user_uuid", tracing::field::display(uuid));

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let roles = self.check_roles(&mut tx, claims, &user.roles).await?;

        self.repository
            .create_user(
                &mut tx,
                claims.tenant,
                UserRow {
                    uuid,
                    email: &email,
                    password_hash: &password_hash,
                    display_name: user.display_name.trim(),
                },
            )
            .await?;

        self.repository
            .set_roles(&mut tx, claims.tenant, uuid, &roles)
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::UserCreate, uuid)
                    .with_metadata(json!({ "email": email })),
            )
            .await?;

        let created = self.repository.get_user(&mut tx, claims.tenant, uuid).await?;

        tx.commit().await?;

        info!(user_uuid = %uuid, "created user");

        Ok(created)
    }

    async fn get_user(&self, claims: &Claims, user: UserUuid) -> Result<UserRecord, UsersServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let user = self.repository.get_user(&mut tx, claims.tenant, user).await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn list_users(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<UserRecord>, UsersServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let (users, total) = self.repository.list_users(&mut tx, claims.tenant, &page).await?;

        tx.commit().await?;

        Ok(Page::new(users, &page, total))
    }

    #[tracing::instrument(
        name = "users.service.update_user",
        skip(self, claims, update),
        fields(tenant_uuid = %claims.tenant, user_uuid = %user),
        err
    )]
    async fn update_user(
        &self,
        claims: &Claims,
        user: UserUuid,
        update: UserUpdate,
    ) -> Result<UserRecord, UsersServiceError> {
        if update.status == Some(UserStatus::Deleted) {
            return Err(UsersServiceError::InvalidTransition);
        }

        let changed_fields = update.changed_fields();

        let password_hash = match update.password {
            Some(password) => {
                self.policy.check(&password)?;

                Some(hash_password_blocking(password).await?)
            }
            None => None,
        };

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let roles = match &update.roles {
            Some(roles) => Some(self.check_roles(&mut tx, claims, roles).await?),
            None => None,
        };

        let rows_affected = self
            .repository
            .update_user(
                &mut tx,
                claims.tenant,
                user,
                UserChanges {
                    display_name: update.display_name.as_deref().map(str::trim),
                    status: update.status,
                    password_hash: password_hash.as_deref(),
                },
            )
            .await?;

        if rows_affected == 0 {
            return Err(UsersServiceError::NotFound);
        }

        if let Some(roles) = roles {
            self.repository
                .set_roles(&mut tx, claims.tenant, user, &roles)
                .await?;
        }

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::UserUpdate, user)
                    .with_metadata(json!({ "fields": changed_fields })),
            )
            .await?;

        let updated = self.repository.get_user(&mut tx, claims.tenant, user).await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "users.service.delete_user",
        skip(self, claims),
        fields(tenant_uuid = %claims.tenant, user_uuid = %user),
        err
    )]
    async fn delete_user(&self, claims: &Claims, user: UserUuid) -> Result<(), UsersServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let rows_affected = self.repository.delete_user(&mut tx, claims.tenant, user).await?;

        if rows_affected == 0 {
            return Err(UsersServiceError::NotFound);
        }

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::UserDelete, user),
            )
            .await?;

        tx.commit().await?;

        info!(user_uuid = %user, "deleted user");

        Ok(())
    }

    #[tracing::instrument(name = "users.service.authenticate", skip(self, credentials), err)]
    async fn authenticate(
        &self,
        credentials: Credentials,
    ) -> Result<AuthenticatedUser, UsersServiceError> {
        let Some(email) = normalize_email(&credentials.email) else {
            verify_password_blocking(credentials.password, None).await?;

            return Err(UsersServiceError::InvalidCredentials);
        };

        let mut tx = self.db.begin_unscoped_transaction().await?;

        let candidates = self.repository.find_login_candidates(&mut tx, &email).await?;

        tx.commit().await?;

        let candidate = match credentials.tenant {
            Some(tenant) => candidates.into_iter().find(|c| c.tenant == tenant),
            None if candidates.len() == 1 => candidates.into_iter().next(),
            None => None,
        };

        let matched = verify_password_blocking(
            credentials.password,
            candidate.as_ref().map(|c| c.password_hash.clone()),
        )
        .await?;

        let Some(candidate) = candidate.filter(|c| {
            matched
                && c.user_status == UserStatus::Active
                && c.tenant_status == TenantStatus::Active
        }) else {
            return Err(UsersServiceError::InvalidCredentials);
        };

        let mut tx = self.db.begin_tenant_transaction(candidate.tenant).await?;

        let user = self
            .repository
            .get_user(&mut tx, candidate.tenant, candidate.user)
            .await?;

        let permissions = self
            .repository
            .permissions(&mut tx, candidate.tenant, candidate.user)
            .await?;

        tx.commit().await?;

        Ok(AuthenticatedUser { user, permissions })
    }
}

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Creates a user in the caller's tenant.
    async fn create_user(&self, claims: &Claims, user: NewUser)
    -> Result<UserRecord, UsersServiceError>;

    async fn get_user(&self, claims: &Claims, user: UserUuid) -> Result<UserRecord, UsersServiceError>;

    /// Lists live users, searching email and display name.
    async fn list_users(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<UserRecord>, UsersServiceError>;

    async fn update_user(
        &self,
        claims: &Claims,
        user: UserUuid,
        update: UserUpdate,
    ) -> Result<UserRecord, UsersServiceError>;

    /// Soft-deletes a user.
    async fn delete_user(&self, claims: &Claims, user: UserUuid) -> Result<(), UsersServiceError>;

    /// Checks login credentials and resolves effective permissions.
    ///
    /// Unknown emails, wrong passwords and inactive accounts all fail with
    /// [`UsersServiceError::InvalidCredentials`].
    async fn authenticate(
        &self,
        credentials: Credentials,
    ) -> Result<AuthenticatedUser, UsersServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::roles::{RolesService, data::NewRole},
        test::{TestContext, helpers::TEST_PASSWORD},
    };

    use super::*;

    fn alice(roles: Vec<RoleUuid>) -> NewUser {
        NewUser {
            email: "Alice@T.Example".to_string(),
            password: TEST_PASSWORD.to_string(),
            display_name: "Alice".to_string(),
            roles,
        }
    }

    fn login(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
            tenant: None,
        }
    }

    #[tokio::test]
    async fn create_user_lowercases_email_and_assigns_roles() -> TestResult {
        let ctx = TestContext::new().await;
        let role = ctx.reader_role().await;

        let user = ctx.users.create_user(&ctx.claims, alice(vec![role])).await?;

        assert_eq!(user.email, "alice@t.example");
        assert_eq!(user.roles, vec![role]);
        assert_eq!(user.status, UserStatus::Active);

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_in_tenant_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.users.create_user(&ctx.claims, alice(vec![])).await?;

        let result = ctx.users.create_user(&ctx.claims, alice(vec![])).await;

        assert!(
            matches!(result, Err(UsersServiceError::DuplicateEmail)),
            "expected DuplicateEmail, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn same_email_in_other_tenant_is_allowed() -> TestResult {
        let ctx = TestContext::new().await;
        let other = ctx.register_tenant("Other", "owner@other.example").await;

        ctx.users.create_user(&ctx.claims, alice(vec![])).await?;
        ctx.users.create_user(&other, alice(vec![])).await?;

        Ok(())
    }

    #[tokio::test]
    async fn email_can_be_reused_after_soft_delete() -> TestResult {
        let ctx = TestContext::new().await;

        let first = ctx.users.create_user(&ctx.claims, alice(vec![])).await?;

        ctx.users.delete_user(&ctx.claims, first.uuid).await?;

        let second = ctx.users.create_user(&ctx.claims, alice(vec![])).await?;

        assert_ne!(first.uuid, second.uuid);

        Ok(())
    }

    #[tokio::test]
    async fn weak_password_lists_violations() {
        let ctx = TestContext::new().await;

        let result = ctx
            .users
            .create_user(
                &ctx.claims,
                NewUser {
                    password: "short".to_string(),
                    ..alice(vec![])
                },
            )
            .await;

        assert!(matches!(result, Err(UsersServiceError::WeakPassword(e)) if !e.violations.is_empty()));
    }

    #[tokio::test]
    async fn role_from_other_tenant_is_invalid() -> TestResult {
        let ctx = TestContext::new().await;
        let other = ctx.register_tenant("Other", "owner@other.example").await;

        let foreign = ctx
            .roles
            .create_role(
                &other,
                NewRole {
                    name: "Foreign".to_string(),
                    permissions: ["tenant.read"].into_iter().collect(),
                },
            )
            .await?;

        let result = ctx
            .users
            .create_user(&ctx.claims, alice(vec![foreign.uuid]))
            .await;

        assert!(matches!(result, Err(UsersServiceError::InvalidRole)));

        Ok(())
    }

    #[tokio::test]
    async fn limited_caller_cannot_assign_admin_role() {
        let ctx = TestContext::new().await;
        let limited = ctx.claims_with(&["user.write"]);

        let result = ctx
            .users
            .create_user(&limited, alice(vec![ctx.admin_role]))
            .await;

        assert!(matches!(result, Err(UsersServiceError::EscalatesPrivileges)));
    }

    #[tokio::test]
    async fn user_in_other_tenant_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let other = ctx.register_tenant("Other", "owner@other.example").await;

        let foreign = ctx.users.create_user(&other, alice(vec![])).await?;

        let result = ctx.users.get_user(&ctx.claims, foreign.uuid).await;

        assert!(matches!(result, Err(UsersServiceError::NotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn update_user_changes_name_and_roles() -> TestResult {
        let ctx = TestContext::new().await;
        let role = ctx.reader_role().await;

        let user = ctx.users.create_user(&ctx.claims, alice(vec![])).await?;

        let updated = ctx
            .users
            .update_user(
                &ctx.claims,
                user.uuid,
                UserUpdate {
                    display_name: Some("Alice A.".to_string()),
                    roles: Some(vec![role, role]),
                    ..UserUpdate::default()
                },
            )
            .await?;

        assert_eq!(updated.display_name, "Alice A.");
        assert_eq!(updated.roles, vec![role]);

        Ok(())
    }

    #[tokio::test]
    async fn update_to_deleted_status_is_invalid() -> TestResult {
        let ctx = TestContext::new().await;

        let user = ctx.users.create_user(&ctx.claims, alice(vec![])).await?;

        let result = ctx
            .users
            .update_user(
                &ctx.claims,
                user.uuid,
                UserUpdate {
                    status: Some(UserStatus::Deleted),
                    ..UserUpdate::default()
                },
            )
            .await;

        assert!(matches!(result, Err(UsersServiceError::InvalidTransition)));

        Ok(())
    }

    #[tokio::test]
    async fn list_users_searches_email() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.users.create_user(&ctx.claims, alice(vec![])).await?;

        let page = ctx
            .users
            .list_users(
                &ctx.claims,
                PageRequest::default().with_search(Some("alice".to_string())),
            )
            .await?;

        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].email, "alice@t.example");

        Ok(())
    }

    #[tokio::test]
    async fn authenticate_returns_union_of_role_permissions() -> TestResult {
        let ctx = TestContext::new().await;
        let role = ctx.reader_role().await;

        let user = ctx.users.create_user(&ctx.claims, alice(vec![role])).await?;

        let authenticated = ctx
            .users
            .authenticate(login("ALICE@t.example", TEST_PASSWORD))
            .await?;

        assert_eq!(authenticated.user.uuid, user.uuid);
        assert!(authenticated.permissions.allows("tenant.read"));
        assert!(!authenticated.permissions.allows("user.write"));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_fail_identically() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.users.create_user(&ctx.claims, alice(vec![])).await?;

        let unknown = ctx
            .users
            .authenticate(login("nobody@t.example", TEST_PASSWORD))
            .await;
        let wrong = ctx
            .users
            .authenticate(login("alice@t.example", "Wrong!123"))
            .await;

        assert!(matches!(unknown, Err(UsersServiceError::InvalidCredentials)));
        assert!(matches!(wrong, Err(UsersServiceError::InvalidCredentials)));

        Ok(())
    }

    #[tokio::test]
    async fn ambiguous_email_needs_tenant() -> TestResult {
        let ctx = TestContext::new().await;
        let other = ctx.register_tenant("Other", "owner@other.example").await;

        ctx.users.create_user(&ctx.claims, alice(vec![])).await?;
        ctx.users.create_user(&other, alice(vec![])).await?;

        let ambiguous = ctx
            .users
            .authenticate(login("alice@t.example", TEST_PASSWORD))
            .await;

        assert!(matches!(ambiguous, Err(UsersServiceError::InvalidCredentials)));

        let scoped = ctx
            .users
            .authenticate(Credentials {
                tenant: Some(other.tenant),
                ..login("alice@t.example", TEST_PASSWORD)
            })
            .await?;

        assert_eq!(scoped.user.tenant, other.tenant);

        Ok(())
    }

    #[tokio::test]
    async fn suspended_user_cannot_log_in() -> TestResult {
        let ctx = TestContext::new().await;

        let user = ctx.users.create_user(&ctx.claims, alice(vec![])).await?;

        ctx.users
            .update_user(
                &ctx.claims,
                user.uuid,
                UserUpdate {
                    status: Some(UserStatus::Suspended),
                    ..UserUpdate::default()
                },
            )
            .await?;

        let result = ctx
            .users
            .authenticate(login("alice@t.example", TEST_PASSWORD))
            .await;

        assert!(matches!(result, Err(UsersServiceError::InvalidCredentials)));

        Ok(())
    }
}
