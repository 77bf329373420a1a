//! Cells Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rustc_hash::FxHashMap;
use sqlx::{
    FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json,
};

use crate::domain::{
    parse_column,
    spreadsheets::{
        batch::{CellContents, Coordinate},
        data::CellRange,
        records::{CellRecord, SheetUuid},
        values::{CellStyle, CellValue, DataType},
    },
    tenants::records::TenantUuid,
    to_sql_int, unsigned_column,
};

const GET_CELLS_SQL: &str = include_str!("../sql/get_cells.sql");
const FIND_CELLS_SQL: &str = include_str!("../sql/find_cells.sql");
const UPSERT_CELLS_SQL: &str = include_str!("../sql/upsert_cells.sql");
const DELETE_CELLS_SQL: &str = include_str!("../sql/delete_cells.sql");
const DELETE_CELLS_OUTSIDE_SQL: &str = include_str!("../sql/delete_cells_outside.sql");

fn split_coordinates(coordinates: &[Coordinate]) -> sqlx::Result<(Vec<i32>, Vec<i32>)> {
    coordinates
        .iter()
        .map(|&(row, col)| Ok((to_sql_int(row)?, to_sql_int(col)?)))
        .collect()
}

/// Column-wise arrays bound to the upsert.
#[derive(Debug, Default)]
struct CellColumns {
    rows: Vec<i32>,
    cols: Vec<i32>,
    data_types: Vec<&'static str>,
    strings: Vec<Option<String>>,
    numbers: Vec<Option<f64>>,
    bools: Vec<Option<bool>>,
    dates: Vec<Option<String>>,
    formulas: Vec<Option<String>>,
    formatted: Vec<Option<String>>,
    styles: Vec<Option<String>>,
}

impl CellColumns {
    fn push(&mut self, (row, col): Coordinate, cell: CellContents) -> sqlx::Result<()> {
        self.rows.push(to_sql_int(row)?);
        self.cols.push(to_sql_int(col)?);
        self.data_types.push(cell.value.data_type().as_str());

        let (string, number, boolean, date) = match cell.value {
            CellValue::String(value) => (Some(value), None, None, None),
            CellValue::Number(value) => (None, Some(value), None, None),
            CellValue::Boolean(value) => (None, None, Some(value), None),
            CellValue::Date { date } => (None, None, None, Some(date.to_string())),
        };

        self.strings.push(string);
        self.numbers.push(number);
        self.bools.push(boolean);
        self.dates.push(date);
        self.formulas.push(cell.formula);
        self.formatted.push(cell.formatted_value);
        self.styles.push(
            cell.style
                .map(|style| serde_json::to_string(&style))
                .transpose()
                .map_err(|error| sqlx::Error::Encode(Box::new(error)))?,
        );

        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCellsRepository;

impl PgCellsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Stored cells inside `range`, row-major.
    pub(crate) async fn get_cells(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        sheet: SheetUuid,
        range: CellRange,
    ) -> Result<Vec<CellRecord>, sqlx::Error> {
        query_as::<Postgres, CellRecord>(GET_CELLS_SQL)
            .bind(tenant.into_uuid())
            .bind(sheet.into_uuid())
            .bind(to_sql_int(range.start_row)?)
            .bind(to_sql_int(range.end_row)?)
            .bind(to_sql_int(range.start_col)?)
            .bind(to_sql_int(range.end_col)?)
            .fetch_all(&mut **tx)
            .await
    }

    /// Current contents of the stored cells among `coordinates`.
    pub(crate) async fn find_cells(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        sheet: SheetUuid,
        coordinates: &[Coordinate],
    ) -> Result<FxHashMap<Coordinate, CellContents>, sqlx::Error> {
        let (rows, cols) = split_coordinates(coordinates)?;

        let cells = query_as::<Postgres, CellRecord>(FIND_CELLS_SQL)
            .bind(tenant.into_uuid())
            .bind(sheet.into_uuid())
            .bind(rows)
            .bind(cols)
            .fetch_all(&mut **tx)
            .await?;

        Ok(cells
            .into_iter()
            .map(|cell| {
                (
                    (cell.row, cell.col),
                    CellContents {
                        value: cell.value,
                        formula: cell.formula,
                        formatted_value: cell.formatted_value,
                        style: cell.style,
                    },
                )
            })
            .collect())
    }

    /// Insert or overwrite cells in one statement; returns them row-major.
    pub(crate) async fn upsert_cells(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        sheet: SheetUuid,
        cells: Vec<(Coordinate, CellContents)>,
    ) -> Result<Vec<CellRecord>, sqlx::Error> {
        if cells.is_empty() {
            return Ok(Vec::new());
        }

        let mut columns = CellColumns::default();

        for (coordinate, contents) in cells {
            columns.push(coordinate, contents)?;
        }

        let mut written = query_as::<Postgres, CellRecord>(UPSERT_CELLS_SQL)
            .bind(tenant.into_uuid())
            .bind(sheet.into_uuid())
            .bind(columns.rows)
            .bind(columns.cols)
            .bind(columns.data_types)
            .bind(columns.strings)
            .bind(columns.numbers)
            .bind(columns.bools)
            .bind(columns.dates)
            .bind(columns.formulas)
            .bind(columns.formatted)
            .bind(columns.styles)
            .fetch_all(&mut **tx)
            .await?;

        written.sort_unstable_by_key(|cell| (cell.row, cell.col));

        Ok(written)
    }

    pub(crate) async fn delete_cells(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        sheet: SheetUuid,
        coordinates: &[Coordinate],
    ) -> Result<u64, sqlx::Error> {
        if coordinates.is_empty() {
            return Ok(0);
        }

        let (rows, cols) = split_coordinates(coordinates)?;

        let rows_affected = query(DELETE_CELLS_SQL)
            .bind(tenant.into_uuid())
            .bind(sheet.into_uuid())
            .bind(rows)
            .bind(cols)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Drop cells that fall outside a shrunken grid.
    pub(crate) async fn delete_cells_outside(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        tenant: TenantUuid,
        sheet: SheetUuid,
        row_count: u32,
        column_count: u32,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CELLS_OUTSIDE_SQL)
            .bind(tenant.into_uuid())
            .bind(sheet.into_uuid())
            .bind(to_sql_int(row_count)?)
            .bind(to_sql_int(column_count)?)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

fn missing_value(column: &str) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("`{column}` is null for its data type").into(),
    }
}

fn try_get_value(row: &PgRow, data_type: DataType) -> sqlx::Result<CellValue> {
    let column = match data_type {
        DataType::String => "string_value",
        DataType::Number => "number_value",
        DataType::Boolean => "bool_value",
        DataType::Date => "date_value",
    };

    let value = match data_type {
        DataType::String => row.try_get::<Option<String>, _>(column)?.map(CellValue::String),
        DataType::Number => row.try_get::<Option<f64>, _>(column)?.map(CellValue::Number),
        DataType::Boolean => row.try_get::<Option<bool>, _>(column)?.map(CellValue::Boolean),
        DataType::Date => row
            .try_get::<Option<SqlxTimestamp>, _>(column)?
            .map(|date| CellValue::Date {
                date: date.to_jiff(),
            }),
    };

    value.ok_or_else(|| missing_value(column))
}

impl<'r> FromRow<'r, PgRow> for CellRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let data_type: DataType = parse_column(row, "data_type")?;

        Ok(Self {
            sheet: SheetUuid::from_uuid(row.try_get("sheet_uuid")?),
            row: unsigned_column(row, "row_index")?,
            col: unsigned_column(row, "column_index")?,
            value: try_get_value(row, data_type)?,
            formula: row.try_get("formula")?,
            formatted_value: row.try_get("formatted_value")?,
            style: row
                .try_get::<Option<Json<CellStyle>>, _>("style")?
                .map(|style| style.0),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
