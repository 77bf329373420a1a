//! Sheets Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::domain::{
    spreadsheets::records::{SheetRecord, SheetUuid, SpreadsheetUuid},
    tenants::records::TenantUuid,
    to_sql_int, unsigned_column,
};

const CREATE_SHEET_SQL: &str = include_str!("../sql/create_sheet.sql");
const NEXT_SHEET_POSITION_SQL: &str = include_str!("../sql/next_sheet_position.sql");
const COUNT_SHEETS_SQL: &str = include_str!("../sql/count_sheets.sql");
const LIST_SHEETS_SQL: &str = include_str!("../sql/list_sheets.sql");
const GET_SHEET_SQL: &str = include_str!("../sql/get_sheet.sql");
const LOCK_SHEET_SQL: &str = include_str!("../sql/lock_sheet.sql");
const UPDATE_SHEET_SQL: &str = include_str!("../sql/update_sheet.sql");
const DELETE_SHEET_SQL: &str = include_str!("../sql/delete_sheet.sql");
const COMPACT_SHEET_POSITIONS_SQL: &str = include_str!("../sql/compact_sheet_positions.sql");

/// Complete set of mutable sheet attributes, written as a whole.
#[derive(Debug)]
pub(crate) struct SheetLayout<'a> {
    pub name: &'a str,
    pub row_count: u32,
    pub column_count: u32,
    pub frozen_rows: u32,
    pub frozen_columns: u32,
    pub hidden_rows: &'a [u32],
    pub hidden_columns: &'a [u32],
}

fn to_sql_ints(values: &[u32]) -> sqlx::Result<Vec<i32>> {
    values.iter().copied().map(to_sql_int).collect()
}

fn unsigned_array_column(row: &PgRow, column: &str) -> sqlx::Result<Vec<u32>> {
    let values: Vec<i32> = row.try_get(column)?;

    values
        .into_iter()
        .map(u32::try_from)
        .collect::<Result<_, _>>()
        .map_err(|error| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(error),
        })
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSheetsRepository;

impl PgSheetsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Append a sheet after the current last position.
    pub(crate) async fn create_sheet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        spreadsheet: SpreadsheetUuid,
        name: &str,
        row_count: u32,
        column_count: u32,
    ) -> Result<SheetRecord, sqlx::Error> {
        let position: i32 = query_scalar(NEXT_SHEET_POSITION_SQL)
            .bind(tenant.into_uuid())
            .bind(spreadsheet.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        query_as::<Postgres, SheetRecord>(CREATE_SHEET_SQL)
            .bind(SheetUuid::new().into_uuid())
            .bind(tenant.into_uuid())
            .bind(spreadsheet.into_uuid())
            .bind(name.trim())
            .bind(position)
            .bind(to_sql_int(row_count)?)
            .bind(to_sql_int(column_count)?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn count_sheets(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        spreadsheet: SpreadsheetUuid,
    ) -> Result<i64, sqlx::Error> {
        query_scalar(COUNT_SHEETS_SQL)
            .bind(tenant.into_uuid())
            .bind(spreadsheet.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Sheets of a spreadsheet in position order.
    pub(crate) async fn list_sheets(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        spreadsheet: SpreadsheetUuid,
    ) -> Result<Vec<SheetRecord>, sqlx::Error> {
        query_as::<Postgres, SheetRecord>(LIST_SHEETS_SQL)
            .bind(tenant.into_uuid())
            .bind(spreadsheet.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_sheet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
    ) -> Result<SheetRecord, sqlx::Error> {
        query_as::<Postgres, SheetRecord>(GET_SHEET_SQL)
            .bind(tenant.into_uuid())
            .bind(spreadsheet.into_uuid())
            .bind(sheet.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch a sheet of a live spreadsheet, holding its row lock so cell
    /// writes and layout changes to it are serialised.
    pub(crate) async fn lock_sheet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        spreadsheet: SpreadsheetUuid,
        sheet: SheetUuid,
    ) -> Result<SheetRecord, sqlx::Error> {
        query_as::<Postgres, SheetRecord>(LOCK_SHEET_SQL)
            .bind(tenant.into_uuid())
            .bind(spreadsheet.into_uuid())
            .bind(sheet.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_sheet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        sheet: SheetUuid,
        layout: SheetLayout<'_>,
    ) -> Result<SheetRecord, sqlx::Error> {
        query_as::<Postgres, SheetRecord>(UPDATE_SHEET_SQL)
            .bind(tenant.into_uuid())
            .bind(sheet.into_uuid())
            .bind(layout.name.trim())
            .bind(to_sql_int(layout.row_count)?)
            .bind(to_sql_int(layout.column_count)?)
            .bind(to_sql_int(layout.frozen_rows)?)
            .bind(to_sql_int(layout.frozen_columns)?)
            .bind(to_sql_ints(layout.hidden_rows)?)
            .bind(to_sql_ints(layout.hidden_columns)?)
            .fetch_one(&mut **tx)
            .await
    }

    /// Remove a sheet and close the gap it leaves in the position order.
    pub(crate) async fn delete_sheet(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        sheet: &SheetRecord,
    ) -> Result<(), sqlx::Error> {
        query(DELETE_SHEET_SQL)
            .bind(tenant.into_uuid())
            .bind(sheet.uuid.into_uuid())
            .execute(&mut **tx)
            .await?;

        query(COMPACT_SHEET_POSITIONS_SQL)
            .bind(tenant.into_uuid())
            .bind(sheet.spreadsheet.into_uuid())
            .bind(to_sql_int(sheet.position)?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for SheetRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: SheetUuid::from_uuid(row.try_get("uuid")?),
            spreadsheet: SpreadsheetUuid::from_uuid(row.try_get("spreadsheet_uuid")?),
            name: row.try_get("name")?,
            position: unsigned_column(row, "position")?,
            row_count: unsigned_column(row, "row_count")?,
            column_count: unsigned_column(row, "column_count")?,
            frozen_rows: unsigned_column(row, "frozen_rows")?,
            frozen_columns: unsigned_column(row, "frozen_columns")?,
            hidden_rows: unsigned_array_column(row, "hidden_rows")?,
            hidden_columns: unsigned_array_column(row, "hidden_columns")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
