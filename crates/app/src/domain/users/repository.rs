//! Users Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    auth::Permissions,
    domain::{
        parse_column,
        roles::records::RoleUuid,
        tenants::records::{TenantStatus, TenantUuid},
        users::records::{UserRecord, UserStatus, UserUuid},
    },
    pagination::{PageRequest, SortOrder},
};

const CREATE_USER_SQL: &str = include_str!("sql/create_user.sql");
const GET_USER_SQL: &str = include_str!("sql/get_user.sql");
const LIST_USERS_SQL: &str = include_str!("sql/list_users.sql");
const COUNT_USERS_SQL: &str = include_str!("sql/count_users.sql");
const UPDATE_USER_SQL: &str = include_str!("sql/update_user.sql");
const DELETE_USER_SQL: &str = include_str!("sql/delete_user.sql");
const DELETE_TENANT_USERS_SQL: &str = include_str!("sql/delete_tenant_users.sql");
const CLEAR_USER_ROLES_SQL: &str = include_str!("sql/clear_user_roles.sql");
const ADD_USER_ROLES_SQL: &str = include_str!("sql/add_user_roles.sql");
const USER_PERMISSIONS_SQL: &str = include_str!("sql/user_permissions.sql");
const FIND_LOGIN_CANDIDATES_SQL: &str = include_str!("sql/find_login_candidates.sql");

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("email", "u.email"),
    ("displayName", "u.display_name"),
    ("display_name", "u.display_name"),
    ("createdAt", "u.created_at"),
    ("created_at", "u.created_at"),
    ("updatedAt", "u.updated_at"),
    ("updated_at", "u.updated_at"),
];

/// Columns for a user insert.
pub(crate) struct UserRow<'a> {
    pub uuid: UserUuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
}

/// Columns changed by a user update; `None` leaves the column alone.
#[derive(Default)]
pub(crate) struct UserChanges<'a> {
    pub display_name: Option<&'a str>,
    pub status: Option<UserStatus>,
    pub password_hash: Option<&'a str>,
}

/// A possible login match found across tenants.
#[derive(Debug, Clone)]
pub(crate) struct LoginCandidate {
    pub user: UserUuid,
    pub tenant: TenantUuid,
    pub password_hash: String,
    pub user_status: UserStatus,
    pub tenant_status: TenantStatus,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgUsersRepository;

impl PgUsersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        user: UserRow<'_>,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_USER_SQL)
            .bind(user.uuid.into_uuid())
            .bind(tenant.into_uuid())
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.display_name)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn get_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        user: UserUuid,
    ) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(GET_USER_SQL)
            .bind(tenant.into_uuid())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_users(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        page: &PageRequest,
    ) -> Result<(Vec<UserRecord>, i64), sqlx::Error> {
        let search = page.search_pattern();
        let order = page.order_by(SORT_COLUMNS, ("u.created_at", SortOrder::Desc), "u.uuid");
        let sql = format!("{LIST_USERS_SQL}ORDER BY {order}\nLIMIT $3 OFFSET $4");

        let users = query_as::<Postgres, UserRecord>(&sql)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await?;

        let total: i64 = query_scalar(COUNT_USERS_SQL)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .fetch_one(&mut **tx)
            .await?;

        Ok((users, total))
    }

    pub(crate) async fn update_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        user: UserUuid,
        changes: UserChanges<'_>,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(UPDATE_USER_SQL)
            .bind(tenant.into_uuid())
            .bind(user.into_uuid())
            .bind(changes.display_name)
            .bind(changes.status.map(UserStatus::as_str))
            .bind(changes.password_hash)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn delete_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        user: UserUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_USER_SQL)
            .bind(tenant.into_uuid())
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Soft-delete every live user of `tenant`.
    pub(crate) async fn delete_tenant_users(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_TENANT_USERS_SQL)
            .bind(tenant.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Replace the user's role set.
    pub(crate) async fn set_roles(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        user: UserUuid,
        roles: &[RoleUuid],
    ) -> Result<(), sqlx::Error> {
        query(CLEAR_USER_ROLES_SQL)
            .bind(tenant.into_uuid())
            .bind(user.into_uuid())
            .execute(&mut **tx)
            .await?;

        if roles.is_empty() {
            return Ok(());
        }

        let uuids: Vec<Uuid> = roles.iter().copied().map(RoleUuid::into_uuid).collect();

        query(ADD_USER_ROLES_SQL)
            .bind(tenant.into_uuid())
            .bind(user.into_uuid())
            .bind(uuids)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Union of the permissions of every role assigned to `user`.
    pub(crate) async fn permissions(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        user: UserUuid,
    ) -> Result<Permissions, sqlx::Error> {
        let permissions: Vec<String> = query_scalar(USER_PERMISSIONS_SQL)
            .bind(tenant.into_uuid())
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        Ok(permissions.into())
    }

    /// Live users with `email` in any live tenant.
    pub(crate) async fn find_login_candidates(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
    ) -> Result<Vec<LoginCandidate>, sqlx::Error> {
        query_as::<Postgres, LoginCandidate>(FIND_LOGIN_CANDIDATES_SQL)
            .bind(email)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for UserRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: UserUuid::from_uuid(row.try_get("uuid")?),
            tenant: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            email: row.try_get("email")?,
            display_name: row.try_get("display_name")?,
            status: parse_column(row, "status")?,
            roles: row
                .try_get::<Vec<Uuid>, _>("role_uuids")?
                .into_iter()
                .map(RoleUuid::from_uuid)
                .collect(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            deleted_at: row
                .try_get::<Option<SqlxTimestamp>, _>("deleted_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for LoginCandidate {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            user: UserUuid::from_uuid(row.try_get("user_uuid")?),
            tenant: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            password_hash: row.try_get("password_hash")?,
            user_status: parse_column(row, "user_status")?,
            tenant_status: parse_column(row, "tenant_status")?,
        })
    }
}
