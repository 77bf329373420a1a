//! Spreadsheet Models
//!
//! Spreadsheet payloads use camelCase keys.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use nexus_app::{
    domain::spreadsheets::{
        data::{CellUpdate, Patch},
        records::{BatchOutcome, CellRecord, SheetRecord, SpreadsheetDetail, SpreadsheetRecord},
        values::{CellStyle, CellValue},
    },
    pagination::Page,
};

/// Absent keys leave a field alone and `null` clears it.
pub(crate) fn patch<'de, D, T>(deserializer: D) -> Result<Patch<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Patch::from)
}

/// Sheet Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SheetResponse {
    pub id: Uuid,
    pub spreadsheet_id: Uuid,
    pub name: String,
    pub position: u32,
    pub row_count: u32,
    pub column_count: u32,
    pub frozen_rows: u32,
    pub frozen_columns: u32,
    pub hidden_rows: Vec<u32>,
    pub hidden_columns: Vec<u32>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SheetRecord> for SheetResponse {
    fn from(sheet: SheetRecord) -> Self {
        SheetResponse {
            id: sheet.uuid.into_uuid(),
            spreadsheet_id: sheet.spreadsheet.into_uuid(),
            name: sheet.name,
            position: sheet.position,
            row_count: sheet.row_count,
            column_count: sheet.column_count,
            frozen_rows: sheet.frozen_rows,
            frozen_columns: sheet.frozen_columns,
            hidden_rows: sheet.hidden_rows,
            hidden_columns: sheet.hidden_columns,
            created_at: sheet.created_at.to_string(),
            updated_at: sheet.updated_at.to_string(),
        }
    }
}

/// Spreadsheet Response
///
/// `sheets` is present on single-spreadsheet responses only.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpreadsheetResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub folder_id: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheets: Option<Vec<SheetResponse>>,
}

impl From<SpreadsheetRecord> for SpreadsheetResponse {
    fn from(spreadsheet: SpreadsheetRecord) -> Self {
        SpreadsheetResponse {
            id: spreadsheet.uuid.into_uuid(),
            tenant_id: spreadsheet.tenant.into_uuid(),
            owner_id: spreadsheet.owner.into_uuid(),
            title: spreadsheet.title,
            folder_id: spreadsheet.folder,
            created_at: spreadsheet.created_at.to_string(),
            updated_at: spreadsheet.updated_at.to_string(),
            sheets: None,
        }
    }
}

impl From<SpreadsheetDetail> for SpreadsheetResponse {
    fn from(detail: SpreadsheetDetail) -> Self {
        SpreadsheetResponse {
            sheets: Some(detail.sheets.into_iter().map(Into::into).collect()),
            ..detail.spreadsheet.into()
        }
    }
}

/// Spreadsheet List Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpreadsheetsResponse {
    pub items: Vec<SpreadsheetResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl From<Page<SpreadsheetRecord>> for SpreadsheetsResponse {
    fn from(page: Page<SpreadsheetRecord>) -> Self {
        SpreadsheetsResponse {
            items: page.items.into_iter().map(Into::into).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}

/// Cell Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CellResponse {
    pub row: u32,
    pub col: u32,

    /// String, number, boolean, or `{"date": "<RFC 3339>"}`
    #[salvo(schema(value_type = Object))]
    pub value: CellValue,

    pub formula: Option<String>,

    /// `string`, `number`, `boolean` or `date`
    pub data_type: String,

    pub formatted_value: Option<String>,

    #[salvo(schema(value_type = Option<Object>))]
    pub style: Option<CellStyle>,

    pub updated_at: String,
}

impl From<CellRecord> for CellResponse {
    fn from(cell: CellRecord) -> Self {
        CellResponse {
            data_type: cell.data_type().as_str().to_string(),
            row: cell.row,
            col: cell.col,
            value: cell.value,
            formula: cell.formula,
            formatted_value: cell.formatted_value,
            style: cell.style,
            updated_at: cell.updated_at.to_string(),
        }
    }
}

/// Cell Range Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CellsResponse {
    /// Stored cells in the range, row-major
    pub cells: Vec<CellResponse>,
}

impl From<Vec<CellRecord>> for CellsResponse {
    fn from(cells: Vec<CellRecord>) -> Self {
        CellsResponse {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }
}

/// Cell Contents Request
///
/// Omitted keys keep the stored field; `null` clears it. A `null` value
/// without a formula deletes the cell.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CellContentsRequest {
    #[serde(default, deserialize_with = "patch")]
    #[salvo(schema(value_type = Option<Object>))]
    pub value: Patch<CellValue>,

    #[serde(default, deserialize_with = "patch")]
    #[salvo(schema(value_type = Option<String>))]
    pub formula: Patch<String>,

    #[serde(default, deserialize_with = "patch")]
    #[salvo(schema(value_type = Option<String>))]
    pub formatted_value: Patch<String>,

    #[serde(default, deserialize_with = "patch")]
    #[salvo(schema(value_type = Option<Object>))]
    pub style: Patch<CellStyle>,
}

impl CellContentsRequest {
    pub(crate) fn at(self, row: u32, col: u32) -> CellUpdate {
        CellUpdate {
            row,
            col,
            value: self.value,
            formula: self.formula,
            formatted_value: self.formatted_value,
            style: self.style,
        }
    }
}

/// One batch entry.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CellUpdateRequest {
    pub row: u32,
    pub col: u32,

    #[serde(flatten)]
    pub contents: CellContentsRequest,
}

impl From<CellUpdateRequest> for CellUpdate {
    fn from(request: CellUpdateRequest) -> Self {
        request.contents.at(request.row, request.col)
    }
}

/// Cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct CoordinateResponse {
    pub row: u32,
    pub col: u32,
}

/// Batch Update Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchResponse {
    /// Entries in the submitted batch
    pub applied: usize,

    /// Cells written, row-major
    pub cells: Vec<CellResponse>,

    /// Coordinates whose stored cell was removed, row-major
    pub cleared: Vec<CoordinateResponse>,
}

impl From<BatchOutcome> for BatchResponse {
    fn from(outcome: BatchOutcome) -> Self {
        BatchResponse {
            applied: outcome.applied,
            cells: outcome.cells.into_iter().map(Into::into).collect(),
            cleared: outcome
                .cleared
                .into_iter()
                .map(|(row, col)| CoordinateResponse { row, col })
                .collect(),
        }
    }
}
