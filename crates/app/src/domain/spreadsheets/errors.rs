//! Spreadsheets service errors.

use sqlx::Error;
use thiserror::Error;

use crate::{
    database::{StorageErrorKind, TransientError, classify},
    domain::spreadsheets::batch::OutOfRangeCell,
};

#[derive(Debug, Error)]
pub enum SpreadsheetsServiceError {
    #[error("spreadsheet or sheet not found")]
    NotFound,

    #[error("invalid spreadsheet data")]
    InvalidData,

    #[error("invalid sheet: {0}")]
    InvalidSheet(String),

    /// Frozen or hidden axes that do not fit the sheet's dimensions.
    #[error("invalid sheet layout: {0}")]
    InvalidLayout(String),

    #[error("{} cell coordinate(s) outside the sheet", cells.len())]
    OutOfRange { cells: Vec<OutOfRangeCell> },

    #[error("batch of {len} cells exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("range start must not be after its end")]
    InvalidRange,

    #[error("a spreadsheet must keep at least one sheet")]
    LastSheet,

    #[error("storage temporarily unavailable")]
    Transient(#[source] Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for SpreadsheetsServiceError {
    fn from(error: Error) -> Self {
        match classify(&error) {
            StorageErrorKind::NotFound => Self::NotFound,
            StorageErrorKind::CheckViolation
            | StorageErrorKind::NotNullViolation
            | StorageErrorKind::UniqueViolation => Self::InvalidData,
            StorageErrorKind::Transient => Self::Transient(error),
            StorageErrorKind::ForeignKeyViolation | StorageErrorKind::Other => Self::Sql(error),
        }
    }
}

impl TransientError for SpreadsheetsServiceError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
