//! Tenants Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    parse_column,
    tenants::{
        data::{NewTenant, TenantUpdate},
        records::{TenantRecord, TenantStatus, TenantUuid},
    },
};

const CREATE_TENANT_SQL: &str = include_str!("sql/create_tenant.sql");
const GET_TENANT_SQL: &str = include_str!("sql/get_tenant.sql");
const UPDATE_TENANT_SQL: &str = include_str!("sql/update_tenant.sql");
const DELETE_TENANT_SQL: &str = include_str!("sql/delete_tenant.sql");

/// PostgreSQL-backed tenants repository.
#[derive(Debug, Clone, Default)]
pub(crate) struct PgTenantsRepository;

impl PgTenantsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_tenant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: TenantUuid,
        tenant: NewTenant,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(CREATE_TENANT_SQL)
            .bind(uuid.into_uuid())
            .bind(tenant.name.trim())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_tenant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(GET_TENANT_SQL)
            .bind(tenant.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_tenant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        update: TenantUpdate,
    ) -> Result<TenantRecord, sqlx::Error> {
        query_as::<Postgres, TenantRecord>(UPDATE_TENANT_SQL)
            .bind(tenant.into_uuid())
            .bind(update.name.as_deref().map(str::trim))
            .bind(update.status.map(TenantStatus::as_str))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_tenant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_TENANT_SQL)
            .bind(tenant.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for TenantRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: TenantUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            status: parse_column(row, "status")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
