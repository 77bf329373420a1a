//! Spreadsheet Records

use jiff::Timestamp;
use uuid::Uuid;

use crate::{
    domain::{
        spreadsheets::values::{CellStyle, CellValue, DataType},
        tenants::records::TenantUuid,
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Spreadsheet UUID
pub type SpreadsheetUuid = TypedUuid<SpreadsheetRecord>;

/// Sheet UUID
pub type SheetUuid = TypedUuid<SheetRecord>;

/// Spreadsheet Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetRecord {
    pub uuid: SpreadsheetUuid,
    pub tenant: TenantUuid,
    pub owner: UserUuid,
    pub title: String,

    /// Drive folder the spreadsheet is filed under, if any.
    pub folder: Option<Uuid>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A spreadsheet with its sheets in position order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetDetail {
    pub spreadsheet: SpreadsheetRecord,
    pub sheets: Vec<SheetRecord>,
}

/// Sheet Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRecord {
    pub uuid: SheetUuid,
    pub spreadsheet: SpreadsheetUuid,
    pub name: String,

    /// Zero-based, contiguous within the spreadsheet.
    pub position: u32,

    pub row_count: u32,
    pub column_count: u32,
    pub frozen_rows: u32,
    pub frozen_columns: u32,

    /// Sorted, distinct, each below `row_count`.
    pub hidden_rows: Vec<u32>,

    /// Sorted, distinct, each below `column_count`.
    pub hidden_columns: Vec<u32>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Cell Record
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub sheet: SheetUuid,
    pub row: u32,
    pub col: u32,
    pub value: CellValue,

    /// Formula source; `value` holds its last evaluated result.
    pub formula: Option<String>,

    pub formatted_value: Option<String>,
    pub style: Option<CellStyle>,
    pub updated_at: Timestamp,
}

impl CellRecord {
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.value.data_type()
    }
}

/// Result of applying a cell batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Entries in the submitted batch.
    pub applied: usize,

    /// Cells written, row-major.
    pub cells: Vec<CellRecord>,

    /// Coordinates whose stored cell was removed, row-major.
    pub cleared: Vec<(u32, u32)>,
}
