//! Audit service errors.

use sqlx::Error;
use thiserror::Error;

use crate::database::{StorageErrorKind, classify};

#[derive(Debug, Error)]
pub enum AuditServiceError {
    #[error("time range start must precede its end")]
    InvalidRange,

    #[error("storage temporarily unavailable")]
    Transient(#[source] Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for AuditServiceError {
    fn from(error: Error) -> Self {
        match classify(&error) {
            StorageErrorKind::Transient => Self::Transient(error),
            _ => Self::Sql(error),
        }
    }
}
