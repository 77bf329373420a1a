//! Spreadsheet Data

use uuid::Uuid;

use crate::domain::spreadsheets::values::{CellStyle, CellValue};

/// Default dimensions of a sheet created without explicit sizes.
pub const DEFAULT_ROW_COUNT: u32 = 1000;
pub const DEFAULT_COLUMN_COUNT: u32 = 26;

/// Name given to the sheet of a spreadsheet created without any.
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Largest grid a sheet may declare.
pub const MAX_ROWS: u32 = 1_048_576;
pub const MAX_COLUMNS: u32 = 16_384;

/// A field in a partial update: left alone, cleared, or replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Missing,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    /// Resolve against the stored value.
    #[must_use]
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Missing => current,
            Self::Clear => None,
            Self::Set(value) => Some(value),
        }
    }

    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl<T> From<Option<T>> for Patch<T> {
    /// `None` clears; use [`Patch::Missing`] to leave a field alone.
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Self::Set)
    }
}

/// New Spreadsheet Data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSpreadsheet {
    pub title: String,
    pub folder: Option<Uuid>,

    /// Initial sheets in order; one default sheet is created when empty.
    pub sheets: Vec<NewSheet>,
}

/// New Sheet Data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSheet {
    pub name: String,
    pub row_count: Option<u32>,
    pub column_count: Option<u32>,
}

impl NewSheet {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (
            self.row_count.unwrap_or(DEFAULT_ROW_COUNT),
            self.column_count.unwrap_or(DEFAULT_COLUMN_COUNT),
        )
    }
}

/// Spreadsheet Update Data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpreadsheetUpdate {
    pub title: Option<String>,
    pub folder: Patch<Uuid>,
}

impl SpreadsheetUpdate {
    pub(crate) fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_some()),
            ("folder", !self.folder.is_missing()),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
    }
}

/// Sheet Update Data
///
/// Hidden index sets replace the stored sets when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetUpdate {
    pub name: Option<String>,
    pub row_count: Option<u32>,
    pub column_count: Option<u32>,
    pub frozen_rows: Option<u32>,
    pub frozen_columns: Option<u32>,
    pub hidden_rows: Option<Vec<u32>>,
    pub hidden_columns: Option<Vec<u32>>,
}

impl SheetUpdate {
    pub(crate) fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.is_some()),
            ("row_count", self.row_count.is_some()),
            ("column_count", self.column_count.is_some()),
            ("frozen_rows", self.frozen_rows.is_some()),
            ("frozen_columns", self.frozen_columns.is_some()),
            ("hidden_rows", self.hidden_rows.is_some()),
            ("hidden_columns", self.hidden_columns.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
    }
}

/// One entry of a cell batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellUpdate {
    pub row: u32,
    pub col: u32,
    pub value: Patch<CellValue>,
    pub formula: Patch<String>,
    pub formatted_value: Patch<String>,
    pub style: Patch<CellStyle>,
}

impl CellUpdate {
    #[must_use]
    pub fn value(row: u32, col: u32, value: CellValue) -> Self {
        Self {
            row,
            col,
            value: Patch::Set(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn clear(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            value: Patch::Clear,
            ..Self::default()
        }
    }
}

/// Closed rectangle of cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub start_row: u32,
    pub end_row: u32,
    pub start_col: u32,
    pub end_col: u32,
}

impl CellRange {
    #[must_use]
    pub const fn is_ordered(&self) -> bool {
        self.start_row <= self.end_row && self.start_col <= self.end_col
    }

    /// The part of the range inside a `row_count` by `column_count` grid, or
    /// `None` when the range starts past its edge.
    #[must_use]
    pub fn within(self, row_count: u32, column_count: u32) -> Option<Self> {
        if self.start_row >= row_count || self.start_col >= column_count {
            return None;
        }

        Some(Self {
            end_row: self.end_row.min(row_count - 1),
            end_col: self.end_col.min(column_count - 1),
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpreadsheetFilter {
    pub folder: Option<Uuid>,
}
