//! Per-test Postgres databases cloned from a migrated template.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool, query};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::{Mutex, OnceCell};
use uuid::Uuid;

const POSTGRES_PORT: u16 = 5432;

const SUPERUSER: &str = "nexus_test";
const SUPERUSER_PASSWORD: &str = "nexus_test_password";

/// Database holding the migrated schema every test database is copied from.
const TEMPLATE_DB: &str = "nexus_template";

static HOST: Lazy<String> = Lazy::new(|| {
    std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string())
});

/// One container per test binary, migrated once.
static SERVER: OnceCell<Server> = OnceCell::const_new();

/// `CREATE DATABASE .. TEMPLATE` fails while another clone holds the template.
static CLONE_LOCK: Mutex<()> = Mutex::const_new(());

struct Server {
    _container: ContainerAsync<Postgres>,
    port: u16,
}

impl Server {
    async fn start() -> Self {
        let container = Postgres::default()
            .with_user(SUPERUSER)
            .with_password(SUPERUSER_PASSWORD)
            .with_db_name("postgres")
            .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
            .start()
            .await
            .expect("postgres container should start");

        let port = container
            .get_host_port_ipv4(POSTGRES_PORT)
            .await
            .expect("postgres port should be mapped");

        let server = Self {
            _container: container,
            port,
        };

        server.migrate_template().await;

        server
    }

    fn url(&self, database: &str) -> String {
        format!(
            "postgresql://{SUPERUSER}:{SUPERUSER_PASSWORD}@{}:{}/{database}",
            *HOST, self.port
        )
    }

    async fn admin_connection(&self) -> PgConnection {
        PgConnection::connect(&self.url("postgres"))
            .await
            .expect("maintenance database should accept connections")
    }

    async fn migrate_template(&self) {
        let mut admin = self.admin_connection().await;

        query(&format!("CREATE DATABASE {TEMPLATE_DB}"))
            .execute(&mut admin)
            .await
            .expect("template database should be created");

        admin.close().await.expect("admin connection should close");

        // The template must have no open sessions once migrated.
        let mut template = PgConnection::connect(&self.url(TEMPLATE_DB))
            .await
            .expect("template database should accept connections");

        sqlx::migrate!("../../migrations")
            .run(&mut template)
            .await
            .expect("migrations should apply to the template");

        template
            .close()
            .await
            .expect("template connection should close");
    }
}

/// A freshly migrated database private to one test.
///
/// Services commit normally; isolation comes from every test owning its
/// database. Databases live until the container is reaped.
#[derive(Debug, Clone)]
pub struct TestDb {
    /// Superuser pool; bypasses row-level security.
    pub pool: PgPool,

    pub name: String,

    /// Superuser URL of this database, for deriving restricted-role URLs.
    pub(super) superuser_url: String,
}

impl TestDb {
    pub async fn new() -> Self {
        let server = SERVER.get_or_init(Server::start).await;
        let name = format!("nexus_test_{}", Uuid::now_v7().simple());

        {
            let _guard = CLONE_LOCK.lock().await;
            let mut admin = server.admin_connection().await;

            query(&format!("CREATE DATABASE {name} TEMPLATE {TEMPLATE_DB}"))
                .execute(&mut admin)
                .await
                .expect("test database should be cloned from the template");

            admin.close().await.expect("admin connection should close");
        }

        let superuser_url = server.url(&name);

        let pool = PgPool::connect(&superuser_url)
            .await
            .expect("test database should accept connections");

        Self {
            pool,
            name,
            superuser_url,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_carry_the_migrated_schema() {
        let test_db = TestDb::new().await;

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name IN ('tenants', 'sheets', 'audit_log')",
        )
        .fetch_one(test_db.pool())
        .await
        .expect("schema query should succeed");

        assert_eq!(tables, 3);
    }

    #[tokio::test]
    async fn clones_do_not_share_rows() {
        let first = TestDb::new().await;
        let second = TestDb::new().await;

        assert_ne!(first.name, second.name);

        sqlx::query("INSERT INTO tenants (uuid, name) VALUES ($1, 'Solo')")
            .bind(Uuid::now_v7())
            .execute(first.pool())
            .await
            .expect("insert should succeed");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants")
            .fetch_one(second.pool())
            .await
            .expect("count should succeed");

        assert_eq!(count, 0);
    }
}
