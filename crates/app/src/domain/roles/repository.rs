//! Roles Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    auth::Permissions,
    domain::{
        roles::{
            data::{NewRole, RoleUpdate},
            records::{RoleRecord, RoleUuid},
        },
        tenants::records::TenantUuid,
    },
    pagination::{PageRequest, SortOrder},
};

const CREATE_ROLE_SQL: &str = include_str!("sql/create_role.sql");
const GET_ROLE_SQL: &str = include_str!("sql/get_role.sql");
const LIST_ROLES_SQL: &str = include_str!("sql/list_roles.sql");
const COUNT_ROLES_SQL: &str = include_str!("sql/count_roles.sql");
const UPDATE_ROLE_SQL: &str = include_str!("sql/update_role.sql");
const DELETE_ROLE_SQL: &str = include_str!("sql/delete_role.sql");
const ROLE_PERMISSIONS_SQL: &str = include_str!("sql/role_permissions.sql");
const COUNT_MATCHING_ROLES_SQL: &str = include_str!("sql/count_matching_roles.sql");

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("name", "name"),
    ("createdAt", "created_at"),
    ("created_at", "created_at"),
    ("updatedAt", "updated_at"),
    ("updated_at", "updated_at"),
];

#[derive(Debug, Clone, Default)]
pub(crate) struct PgRolesRepository;

impl PgRolesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        role: NewRole,
    ) -> Result<RoleRecord, sqlx::Error> {
        query_as::<Postgres, RoleRecord>(CREATE_ROLE_SQL)
            .bind(RoleUuid::new().into_uuid())
            .bind(tenant.into_uuid())
            .bind(role.name.trim())
            .bind(role.permissions.into_vec())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        role: RoleUuid,
    ) -> Result<RoleRecord, sqlx::Error> {
        query_as::<Postgres, RoleRecord>(GET_ROLE_SQL)
            .bind(tenant.into_uuid())
            .bind(role.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_roles(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        page: &PageRequest,
    ) -> Result<(Vec<RoleRecord>, i64), sqlx::Error> {
        let search = page.search_pattern();
        let order = page.order_by(SORT_COLUMNS, ("name", SortOrder::Asc), "uuid");
        let sql = format!("{LIST_ROLES_SQL}ORDER BY {order}\nLIMIT $3 OFFSET $4");

        let roles = query_as::<Postgres, RoleRecord>(&sql)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await?;

        let total: i64 = query_scalar(COUNT_ROLES_SQL)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .fetch_one(&mut **tx)
            .await?;

        Ok((roles, total))
    }

    pub(crate) async fn update_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        role: RoleUuid,
        update: RoleUpdate,
    ) -> Result<RoleRecord, sqlx::Error> {
        query_as::<Postgres, RoleRecord>(UPDATE_ROLE_SQL)
            .bind(tenant.into_uuid())
            .bind(role.into_uuid())
            .bind(update.name.as_deref().map(str::trim))
            .bind(update.permissions.map(Permissions::into_vec))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_role(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        role: RoleUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_ROLE_SQL)
            .bind(tenant.into_uuid())
            .bind(role.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Union of the permissions granted by `roles`.
    pub(crate) async fn permissions_of(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        roles: &[RoleUuid],
    ) -> Result<Permissions, sqlx::Error> {
        let uuids: Vec<Uuid> = roles.iter().copied().map(RoleUuid::into_uuid).collect();

        let permissions: Vec<String> = query_scalar(ROLE_PERMISSIONS_SQL)
            .bind(tenant.into_uuid())
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await?;

        Ok(permissions.into())
    }

    /// How many of `roles` exist in `tenant`.
    pub(crate) async fn count_matching(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        roles: &[RoleUuid],
    ) -> Result<i64, sqlx::Error> {
        let uuids: Vec<Uuid> = roles.iter().copied().map(RoleUuid::into_uuid).collect();

        query_scalar(COUNT_MATCHING_ROLES_SQL)
            .bind(tenant.into_uuid())
            .bind(uuids)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for RoleRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: RoleUuid::from_uuid(row.try_get("uuid")?),
            tenant: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            name: row.try_get("name")?,
            permissions: row.try_get::<Vec<String>, _>("permissions")?.into(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
