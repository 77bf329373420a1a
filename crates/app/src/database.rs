//! Database connection management

use std::{fmt::Display, future::Future, time::Duration};

use sqlx::{
    Error, PgPool, Postgres, Transaction,
    error::{DatabaseError, ErrorKind},
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    query, query_scalar,
};
use tracing::warn;

use crate::domain::tenants::records::TenantUuid;

/// SQL used to set tenant context for row-level security.
pub const SET_TENANT_CONTEXT_SQL: &str = "SELECT set_config('app.current_tenant_uuid', $1, true)";

const RLS_BYPASS_SQL: &str =
    "SELECT rolsuper OR rolbypassrls FROM pg_roles WHERE rolname = current_user";

/// Total attempts made by [`retry_transient`], including the first.
pub const RETRY_ATTEMPTS: u32 = 3;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(25);

/// Connection settings assembled from the `DB_*` environment.
#[derive(Debug, Clone)]
pub struct DbSettings {
    /// Database server host.
    pub host: String,

    /// Database server port.
    pub port: u16,

    /// Login role.
    pub user: String,

    /// Login password.
    pub password: String,

    /// Database name.
    pub name: String,

    /// libpq-style SSL mode (`disable`, `prefer`, `require`, ...).
    pub ssl_mode: String,

    /// Upper bound on pooled connections.
    pub max_connections: u32,

    /// Connections kept open while idle.
    pub min_connections: u32,

    /// How long a request may wait for a pooled connection.
    pub acquire_timeout: Duration,
}

impl DbSettings {
    /// Build driver connection options.
    ///
    /// # Errors
    ///
    /// Returns an error when the SSL mode is not recognised.
    pub fn connect_options(&self) -> Result<PgConnectOptions, Error> {
        let ssl_mode = self
            .ssl_mode
            .parse::<PgSslMode>()
            .map_err(|error| Error::Configuration(Box::new(error)))?;

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(ssl_mode))
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
    }
}

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction and set tenant context for RLS policies.
    ///
    /// Transient failures while acquiring a connection or starting the
    /// transaction are retried; nothing has been written at that point.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or setting tenant context fails.
    pub async fn begin_tenant_transaction(
        &self,
        tenant: TenantUuid,
    ) -> Result<Transaction<'static, Postgres>, Error> {
        retry_transient(|| async {
            let mut tx = self.pool.begin().await?;

            query(SET_TENANT_CONTEXT_SQL)
                .bind(tenant.into_uuid().to_string())
                .execute(&mut *tx)
                .await?;

            Ok::<_, Error>(tx)
        })
        .await
    }

    /// Begin a transaction without tenant context.
    ///
    /// Only security-definer lookups (login, API-key resolution) return rows
    /// in such a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error when the transaction cannot be started.
    pub async fn begin_unscoped_transaction(&self) -> Result<Transaction<'static, Postgres>, Error> {
        retry_transient(|| self.pool.begin()).await
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, Error> {
    PgPool::connect(database_url).await
}

/// Connect to `PostgreSQL` using discrete settings.
///
/// # Errors
///
/// Returns an error if the options are invalid or the connection cannot be established.
pub async fn connect_with(settings: &DbSettings) -> Result<PgPool, Error> {
    settings
        .pool_options()
        .connect_with(settings.connect_options()?)
        .await
}

/// Apply pending migrations from the workspace `migrations/` directory.
///
/// # Errors
///
/// Returns an error when a migration fails to apply.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}

/// Warn when the runtime role would bypass row-level security.
///
/// # Errors
///
/// Returns an error when the role attributes cannot be read.
pub async fn ensure_rls_enforced_role(pool: &PgPool) -> Result<bool, Error> {
    let bypasses = query_scalar::<_, bool>(RLS_BYPASS_SQL)
        .fetch_optional(pool)
        .await?
        .unwrap_or(false);

    if bypasses {
        warn!("database role bypasses row-level security; tenant isolation relies on query filters only");
    }

    Ok(!bypasses)
}

/// Storage failure classes that services translate into domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    NotFound,
    UniqueViolation,
    ForeignKeyViolation,
    NotNullViolation,
    CheckViolation,
    Transient,
    Other,
}

/// Classify a driver error.
#[must_use]
pub fn classify(error: &Error) -> StorageErrorKind {
    if matches!(error, Error::RowNotFound) {
        return StorageErrorKind::NotFound;
    }

    if error.is_transient() {
        return StorageErrorKind::Transient;
    }

    match error.as_database_error().map(DatabaseError::kind) {
        Some(ErrorKind::UniqueViolation) => StorageErrorKind::UniqueViolation,
        Some(ErrorKind::ForeignKeyViolation) => StorageErrorKind::ForeignKeyViolation,
        Some(ErrorKind::NotNullViolation) => StorageErrorKind::NotNullViolation,
        Some(ErrorKind::CheckViolation) => StorageErrorKind::CheckViolation,
        Some(ErrorKind::Other | _) | None => StorageErrorKind::Other,
    }
}

/// Errors that may succeed when the same unit of work is attempted again.
pub trait TransientError {
    fn is_transient(&self) -> bool;
}

impl TransientError for Error {
    fn is_transient(&self) -> bool {
        match self {
            Error::Io(_) | Error::PoolTimedOut => true,
            // serialization_failure, deadlock_detected
            Error::Database(error) => matches!(error.code().as_deref(), Some("40001" | "40P01")),
            _ => false,
        }
    }
}

/// Run `operation`, retrying transient failures with exponential backoff.
///
/// The operation must be safe to repeat: each attempt opens its own
/// transaction, and a failed attempt leaves nothing behind.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or the first
/// non-transient error.
pub async fn retry_transient<T, E, F, Fut>(mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: TransientError + Display,
{
    let mut attempt = 1;

    loop {
        match operation().await {
            Err(error) if error.is_transient() && attempt < RETRY_ATTEMPTS => {
                let delay = RETRY_BASE_DELAY * 2_u32.pow(attempt - 1);

                warn!(
                    attempt,
                    delay_ms = delay.as_millis(),
                    "retrying after transient storage error: {error}"
                );

                tokio::time::sleep(delay).await;

                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use thiserror::Error;

    use super::*;

    #[derive(Debug, Error)]
    #[error("flaky")]
    struct Flaky {
        transient: bool,
    }

    impl TransientError for Flaky {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    #[tokio::test]
    async fn retry_transient_retries_until_success() {
        let calls = AtomicU32::new(0);

        let result = retry_transient(|| async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Flaky { transient: true })
            } else {
                Ok(7)
            }
        })
        .await;

        assert!(matches!(result, Ok(7)), "expected success, got {result:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 2, "expected one retry");
    }

    #[tokio::test]
    async fn retry_transient_gives_up_after_bounded_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), Flaky> = retry_transient(|| async {
            calls.fetch_add(1, Ordering::SeqCst);

            Err(Flaky { transient: true })
        })
        .await;

        assert!(result.is_err(), "expected final error");
        assert_eq!(calls.load(Ordering::SeqCst), RETRY_ATTEMPTS);
    }

    #[tokio::test]
    async fn retry_transient_surfaces_permanent_errors_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<(), Flaky> = retry_transient(|| async {
            calls.fetch_add(1, Ordering::SeqCst);

            Err(Flaky { transient: false })
        })
        .await;

        assert!(result.is_err(), "expected error");
        assert_eq!(calls.load(Ordering::SeqCst), 1, "permanent errors are not retried");
    }

    #[test]
    fn classify_maps_row_not_found() {
        assert_eq!(classify(&Error::RowNotFound), StorageErrorKind::NotFound);
    }

    #[test]
    fn classify_treats_pool_timeout_as_transient() {
        assert_eq!(classify(&Error::PoolTimedOut), StorageErrorKind::Transient);
    }

    #[test]
    fn settings_reject_unknown_ssl_mode() {
        let settings = DbSettings {
            host: "localhost".to_string(),
            port: 5432,
            user: "nexus".to_string(),
            password: "secret".to_string(),
            name: "nexus".to_string(),
            ssl_mode: "sometimes".to_string(),
            max_connections: 5,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(1),
        };

        assert!(settings.connect_options().is_err());
    }
}
