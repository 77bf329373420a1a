//! Spreadsheets Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    domain::{
        spreadsheets::{
            data::{Patch, SpreadsheetFilter, SpreadsheetUpdate},
            records::{SpreadsheetRecord, SpreadsheetUuid},
        },
        tenants::records::TenantUuid,
        users::records::UserUuid,
    },
    pagination::{PageRequest, SortOrder},
};

const CREATE_SPREADSHEET_SQL: &str = include_str!("../sql/create_spreadsheet.sql");
const GET_SPREADSHEET_SQL: &str = include_str!("../sql/get_spreadsheet.sql");
const LOCK_SPREADSHEET_SQL: &str = include_str!("../sql/lock_spreadsheet.sql");
const LIST_SPREADSHEETS_SQL: &str = include_str!("../sql/list_spreadsheets.sql");
const COUNT_SPREADSHEETS_SQL: &str = include_str!("../sql/count_spreadsheets.sql");
const UPDATE_SPREADSHEET_SQL: &str = include_str!("../sql/update_spreadsheet.sql");
const TOUCH_SPREADSHEET_SQL: &str = include_str!("../sql/touch_spreadsheet.sql");
const DELETE_SPREADSHEET_SQL: &str = include_str!("../sql/delete_spreadsheet.sql");

const SORT_COLUMNS: &[(&str, &str)] = &[
    ("title", "title"),
    ("createdAt", "created_at"),
    ("created_at", "created_at"),
    ("updatedAt", "updated_at"),
    ("updated_at", "updated_at"),
];

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSpreadsheetsRepository;

impl PgSpreadsheetsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_spreadsheet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        owner: UserUuid,
        title: &str,
        folder: Option<Uuid>,
    ) -> Result<SpreadsheetRecord, sqlx::Error> {
        query_as::<Postgres, SpreadsheetRecord>(CREATE_SPREADSHEET_SQL)
            .bind(SpreadsheetUuid::new().into_uuid())
            .bind(tenant.into_uuid())
            .bind(owner.into_uuid())
            .bind(title.trim())
            .bind(folder)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_spreadsheet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        spreadsheet: SpreadsheetUuid,
    ) -> Result<SpreadsheetRecord, sqlx::Error> {
        query_as::<Postgres, SpreadsheetRecord>(GET_SPREADSHEET_SQL)
            .bind(tenant.into_uuid())
            .bind(spreadsheet.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch a live spreadsheet and serialise structural changes to it.
    pub(crate) async fn lock_spreadsheet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        spreadsheet: SpreadsheetUuid,
    ) -> Result<SpreadsheetRecord, sqlx::Error> {
        query_as::<Postgres, SpreadsheetRecord>(LOCK_SPREADSHEET_SQL)
            .bind(tenant.into_uuid())
            .bind(spreadsheet.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_spreadsheets(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        filter: &SpreadsheetFilter,
        page: &PageRequest,
    ) -> Result<(Vec<SpreadsheetRecord>, i64), sqlx::Error> {
        let search = page.search_pattern();
        let order = page.order_by(SORT_COLUMNS, ("updated_at", SortOrder::Desc), "uuid");
        let sql = format!("{LIST_SPREADSHEETS_SQL}ORDER BY {order}\nLIMIT $4 OFFSET $5");

        let spreadsheets = query_as::<Postgres, SpreadsheetRecord>(&sql)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .bind(filter.folder)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await?;

        let total: i64 = query_scalar(COUNT_SPREADSHEETS_SQL)
            .bind(tenant.into_uuid())
            .bind(search.as_deref())
            .bind(filter.folder)
            .fetch_one(&mut **tx)
            .await?;

        Ok((spreadsheets, total))
    }

    pub(crate) async fn update_spreadsheet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        spreadsheet: SpreadsheetUuid,
        update: SpreadsheetUpdate,
    ) -> Result<SpreadsheetRecord, sqlx::Error> {
        let (replace_folder, folder) = match update.folder {
            Patch::Missing => (false, None),
            Patch::Clear => (true, None),
            Patch::Set(folder) => (true, Some(folder)),
        };

        query_as::<Postgres, SpreadsheetRecord>(UPDATE_SPREADSHEET_SQL)
            .bind(tenant.into_uuid())
            .bind(spreadsheet.into_uuid())
            .bind(update.title.as_deref().map(str::trim))
            .bind(replace_folder)
            .bind(folder)
            .fetch_one(&mut **tx)
            .await
    }

    /// Bump `updated_at` after a change to one of its sheets or cells.
    pub(crate) async fn touch_spreadsheet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        spreadsheet: SpreadsheetUuid,
    ) -> Result<(), sqlx::Error> {
        query(TOUCH_SPREADSHEET_SQL)
            .bind(tenant.into_uuid())
            .bind(spreadsheet.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Soft-delete; sheets and cells stay in place but become unreachable.
    pub(crate) async fn delete_spreadsheet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        spreadsheet: SpreadsheetUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_SPREADSHEET_SQL)
            .bind(tenant.into_uuid())
            .bind(spreadsheet.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for SpreadsheetRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: SpreadsheetUuid::from_uuid(row.try_get("uuid")?),
            tenant: TenantUuid::from_uuid(row.try_get("tenant_uuid")?),
            owner: UserUuid::from_uuid(row.try_get("owner_uuid")?),
            title: row.try_get("title")?,
            folder: row.try_get("folder_uuid")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
