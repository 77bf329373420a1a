//! App Context

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{
    auth::{PasswordPolicy, TokenManager},
    database::{self, Db, DbSettings},
    domain::{
        api_keys::{ApiKeysService, PgApiKeysService},
        audit::{AuditService, PgAuditService},
        databases::{DatabasesService, PgDatabasesService},
        roles::{PgRolesService, RolesService},
        spreadsheets::{PgSpreadsheetsService, SpreadsheetsService},
        subscriptions::{PgSubscriptionsService, SubscriptionsService},
        tenants::{PgTenantsService, TenantsService},
        users::{PgUsersService, UsersService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

/// Every service the HTTP layer and CLI need, behind trait objects.
#[derive(Clone)]
pub struct AppContext {
    pub tenants: Arc<dyn TenantsService>,
    pub users: Arc<dyn UsersService>,
    pub roles: Arc<dyn RolesService>,
    pub api_keys: Arc<dyn ApiKeysService>,
    pub databases: Arc<dyn DatabasesService>,
    pub subscriptions: Arc<dyn SubscriptionsService>,
    pub audit: Arc<dyn AuditService>,
    pub spreadsheets: Arc<dyn SpreadsheetsService>,
    pub tokens: TokenManager,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build the Postgres-backed services over an existing handle.
    #[must_use]
    pub fn from_db(db: &Db, tokens: TokenManager, policy: PasswordPolicy) -> Self {
        Self {
            tenants: Arc::new(PgTenantsService::new(db.clone(), policy)),
            users: Arc::new(PgUsersService::new(db.clone(), policy)),
            roles: Arc::new(PgRolesService::new(db.clone())),
            api_keys: Arc::new(PgApiKeysService::new(db.clone())),
            databases: Arc::new(PgDatabasesService::new(db.clone())),
            subscriptions: Arc::new(PgSubscriptionsService::new(db.clone())),
            audit: Arc::new(PgAuditService::new(db.clone())),
            spreadsheets: Arc::new(PgSpreadsheetsService::new(db.clone())),
            tokens,
        }
    }

    /// Build application context from database settings.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn connect(
        settings: &DbSettings,
        tokens: TokenManager,
        policy: PasswordPolicy,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect_with(settings)
            .await
            .map_err(AppInitError::Database)?;

        Self::from_pool(pool, tokens, policy).await
    }

    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        tokens: TokenManager,
        policy: PasswordPolicy,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        Self::from_pool(pool, tokens, policy).await
    }

    async fn from_pool(
        pool: sqlx::PgPool,
        tokens: TokenManager,
        policy: PasswordPolicy,
    ) -> Result<Self, AppInitError> {
        database::ensure_rls_enforced_role(&pool)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::from_db(&Db::new(pool), tokens, policy))
    }
}
