//! API Keys Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    auth::Permissions,
    domain::{
        api_keys::records::{ApiKeyRecord, ApiKeyStatus, ApiKeyUuid},
        parse_column,
        tenants::records::{TenantStatus, TenantUuid},
        users::records::{UserStatus, UserUuid},
    },
    pagination::{PageRequest, SortOrder},
};

const CREATE_API_KEY_SQL: &str = include_str!("sql/create_api_key.sql");
const GET_API_KEY_SQL: &str = include_str!("sql/get_api_key.sql");
const LIST_API_KEYS_SQL: &str = include_str!("sql/list_api_keys.sql");
const COUNT_API_KEYS_SQL: &str = include_str!("sql/count_api_keys.sql");
const REVOKE_API_KEY_SQL: &str = include_str!("sql/revoke_api_key.sql");
const REVOKE_TENANT_API_KEYS_SQL: &str = include_str!("sql/revoke_tenant_api_keys.sql");
const FIND_API_KEY_BY_PREFIX_SQL: &str = include_str!("sql/find_api_key_by_prefix.sql");
const TOUCH_API_KEY_SQL: &str = include_str!("sql/touch_api_key.sql");

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("name", "name"),
    ("prefix", "prefix"),
    ("status", "status"),
    ("expiresAt", "expires_at"),
    ("expires_at", "expires_at"),
    ("createdAt", "created_at"),
    ("created_at", "created_at"),
];

/// Columns for an API key insert.
pub(crate) struct ApiKeyRow<'a> {
    pub uuid: ApiKeyUuid,
    pub owner: UserUuid,
    pub name: &'a str,
    pub prefix: &'a str,
    pub secret_hash: &'a str,
    pub scopes: &'a Permissions,
    pub expires_at: Timestamp,
}

/// A key resolved by prefix, joined with its owner and tenant state.
#[derive(Debug, Clone)]
pub(crate) struct ApiKeyLookup {
    pub uuid: ApiKeyUuid,
    pub tenant: TenantUuid,
    pub owner: UserUuid,
    pub secret_hash: String,
    pub scopes: Permissions,
    pub status: ApiKeyStatus,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub owner_email: String,
    pub owner_status: UserStatus,
    pub owner_deleted: bool,
    pub tenant_status: TenantStatus,
    pub tenant_deleted: bool,
}

impl ApiKeyLookup {
    /// Whether the key may authenticate a request at `now`.
    pub(crate) fn is_usable_at(&self, now: Timestamp) -> bool {
        self.status == ApiKeyStatus::Active
            && self.expires_at > now
            && self.owner_status == UserStatus::Active
            && !self.owner_deleted
            && self.tenant_status == TenantStatus::Active
            && !self.tenant_deleted
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgApiKeysRepository;

impl PgApiKeysRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_api_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        key: ApiKeyRow<'_>,
    ) -> Result<ApiKeyRecord, sqlx::Error> {
        query_as::<Postgres, ApiKeyRecord>(CREATE_API_KEY_SQL)
            .bind(key.uuid.into_uuid())
            .bind(tenant.into_uuid())
            .bind(key.owner.into_uuid())
            .bind(key.name)
            .bind(key.prefix)
            .bind(key.secret_hash)
            .bind(key.scopes.clone().into_vec())
            .bind(SqlxTimestamp::from(key.expires_at))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_api_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        key: ApiKeyUuid,
    ) -> Result<ApiKeyRecord, sqlx::Error> {
        query_as::<Postgres, ApiKeyRecord>(GET_API_KEY_SQL)
            .bind(tenant.into_uuid())
            .bind(key.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_api_keys(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        page: &PageRequest,
    ) -> Result<(Vec<ApiKeyRecord>, i64), sqlx::Error> {
        let search = page.search_pattern();
        let order = page.order_by(SORT_COLUMNS, ("created_at", SortOrder::Desc), "uuid");
        let sql = format!("{LIST_API_KEYS_SQL}ORDER BY {order}\nLIMIT $3 OFFSET $4");

        let keys = query_as::<Postgres, ApiKeyRecord>(&sql)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await?;

        let total: i64 = query_scalar(COUNT_API_KEYS_SQL)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .fetch_one(&mut **tx)
            .await?;

        Ok((keys, total))
    }

    /// Revoke an active key; `None` when no active key matched.
    pub(crate) async fn revoke_api_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        key: ApiKeyUuid,
    ) -> Result<Option<ApiKeyRecord>, sqlx::Error> {
        query_as::<Postgres, ApiKeyRecord>(REVOKE_API_KEY_SQL)
            .bind(tenant.into_uuid())
            .bind(key.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Revoke every active key of `tenant`.
    pub(crate) async fn revoke_tenant_keys(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(REVOKE_TENANT_API_KEYS_SQL)
            .bind(tenant.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn find_by_prefix(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        prefix: &str,
    ) -> Result<Option<ApiKeyLookup>, sqlx::Error> {
        query_as::<Postgres, ApiKeyLookup>(FIND_API_KEY_BY_PREFIX_SQL)
            .bind(prefix)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn touch_last_used(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        key: ApiKeyUuid,
    ) -> Result<(), sqlx::Error> {
        query(TOUCH_API_KEY_SQL)
            .bind(tenant.into_uuid())
            .bind(key.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for ApiKeyRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ApiKeyUuid::from_uuid(row.try_get("uuid")?),
            tenant: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            owner: UserUuid::from_uuid(row.try_get("owner_uuid")?),
            name: row.try_get("name")?,
            prefix: row.try_get("prefix")?,
            scopes: row.try_get::<Vec<String>, _>("scopes")?.into(),
            status: parse_column(row, "status")?,
            expires_at: row.try_get::<SqlxTimestamp, _>("expires_at")?.to_jiff(),
            last_used_at: row
                .try_get::<Option<SqlxTimestamp>, _>("last_used_at")?
                .map(SqlxTimestamp::to_jiff),
            revoked_at: row
                .try_get::<Option<SqlxTimestamp>, _>("revoked_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ApiKeyLookup {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ApiKeyUuid::from_uuid(row.try_get("uuid")?),
            tenant: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            owner: UserUuid::from_uuid(row.try_get("owner_uuid")?),
            secret_hash: row.try_get("secret_hash")?,
            scopes: row.try_get::<Vec<String>, _>("scopes")?.into(),
            status: parse_column(row, "status")?,
            expires_at: row.try_get::<SqlxTimestamp, _>("expires_at")?.to_jiff(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            owner_email: row.try_get("owner_email")?,
            owner_status: parse_column(row, "owner_status")?,
            owner_deleted: row.try_get("owner_deleted")?,
            tenant_status: parse_column(row, "tenant_status")?,
            tenant_deleted: row.try_get("tenant_deleted")?,
        })
    }
}
