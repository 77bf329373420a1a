//! Database Instances Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    domain::{
        databases::{
            data::{ConnectionInfo, NewDatabase},
            records::{DatabaseEngine, DatabaseRecord, DatabaseStatus, DatabaseUuid, SizeClass},
        },
        parse_column,
        tenants::records::TenantUuid,
    },
    pagination::{PageRequest, SortOrder},
};

const CREATE_DATABASE_SQL: &str = include_str!("sql/create_database.sql");
const GET_DATABASE_SQL: &str = include_str!("sql/get_database.sql");
const LOCK_DATABASE_SQL: &str = include_str!("sql/lock_database.sql");
const LIST_DATABASES_SQL: &str = include_str!("sql/list_databases.sql");
const COUNT_DATABASES_SQL: &str = include_str!("sql/count_databases.sql");
const UPDATE_DATABASE_SQL: &str = include_str!("sql/update_database.sql");
const DELETE_TENANT_DATABASES_SQL: &str = include_str!("sql/delete_tenant_databases.sql");

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("name", "name"),
    ("engine", "engine"),
    ("status", "status"),
    ("sizeClass", "size_class"),
    ("size_class", "size_class"),
    ("createdAt", "created_at"),
    ("created_at", "created_at"),
    ("updatedAt", "updated_at"),
    ("updated_at", "updated_at"),
];

/// Columns written by a state change; `None` keeps the stored value.
pub(crate) struct DatabaseChanges<'a> {
    pub status: DatabaseStatus,
    pub size_class: Option<SizeClass>,
    pub connection: Option<&'a ConnectionInfo>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDatabasesRepository;

impl PgDatabasesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_database(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        database: NewDatabase,
    ) -> Result<DatabaseRecord, sqlx::Error> {
        query_as::<Postgres, DatabaseRecord>(CREATE_DATABASE_SQL)
            .bind(DatabaseUuid::new().into_uuid())
            .bind(tenant.into_uuid())
            .bind(database.name.trim())
            .bind(database.engine.as_str())
            .bind(database.size_class.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_database(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        database: DatabaseUuid,
    ) -> Result<DatabaseRecord, sqlx::Error> {
        query_as::<Postgres, DatabaseRecord>(GET_DATABASE_SQL)
            .bind(tenant.into_uuid())
            .bind(database.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch a live instance and hold its row lock until the transaction ends.
    pub(crate) async fn lock_database(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        database: DatabaseUuid,
    ) -> Result<DatabaseRecord, sqlx::Error> {
        query_as::<Postgres, DatabaseRecord>(LOCK_DATABASE_SQL)
            .bind(tenant.into_uuid())
            .bind(database.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_databases(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        page: &PageRequest,
    ) -> Result<(Vec<DatabaseRecord>, i64), sqlx::Error> {
        let search = page.search_pattern();
        let order = page.order_by(SORT_COLUMNS, ("created_at", SortOrder::Desc), "uuid");
        let sql = format!("{LIST_DATABASES_SQL}ORDER BY {order}\nLIMIT $3 OFFSET $4");

        let databases = query_as::<Postgres, DatabaseRecord>(&sql)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await?;

        let total: i64 = query_scalar(COUNT_DATABASES_SQL)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .fetch_one(&mut **tx)
            .await?;

        Ok((databases, total))
    }

    pub(crate) async fn update_database(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        database: DatabaseUuid,
        changes: DatabaseChanges<'_>,
    ) -> Result<DatabaseRecord, sqlx::Error> {
        let connection = changes.connection;

        query_as::<Postgres, DatabaseRecord>(UPDATE_DATABASE_SQL)
            .bind(tenant.into_uuid())
            .bind(database.into_uuid())
            .bind(changes.status.as_str())
            .bind(changes.size_class.map(SizeClass::as_str))
            .bind(connection.map(|c| c.host.as_str()))
            .bind(connection.map(|c| i32::from(c.port)))
            .bind(connection.map(|c| c.database.as_str()))
            .fetch_one(&mut **tx)
            .await
    }

    /// Mark every live instance of `tenant` deleted.
    pub(crate) async fn delete_tenant_databases(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_TENANT_DATABASES_SQL)
            .bind(tenant.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for DatabaseRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let port = row
            .try_get::<Option<i32>, _>("port")?
            .map(u16::try_from)
            .transpose()
            .map_err(|error| sqlx::Error::ColumnDecode {
                index: "port".to_string(),
                source: Box::new(error),
            })?;

        Ok(Self {
            uuid: DatabaseUuid::from_uuid(row.try_get("uuid")?),
            tenant: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            name: row.try_get("name")?,
            engine: parse_column::<DatabaseEngine>(row, "engine")?,
            size_class: parse_column(row, "size_class")?,
            status: parse_column(row, "status")?,
            host: row.try_get("host")?,
            port,
            database_name: row.try_get("database_name")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
