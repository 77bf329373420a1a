//! Database instances service errors.

use sqlx::Error;
use thiserror::Error;

use crate::{
    database::{StorageErrorKind, classify},
    domain::databases::records::DatabaseStatus,
};

#[derive(Debug, Error)]
pub enum DatabasesServiceError {
    #[error("a database with this name already exists")]
    AlreadyExists,

    #[error("database not found")]
    NotFound,

    #[error("cannot move database from {from} to {to}")]
    InvalidTransition {
        from: DatabaseStatus,
        to: DatabaseStatus,
    },

    #[error("invalid database data")]
    InvalidData,

    #[error("storage temporarily unavailable")]
    Transient(#[source] Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for DatabasesServiceError {
    fn from(error: Error) -> Self {
        match classify(&error) {
            StorageErrorKind::NotFound => Self::NotFound,
            StorageErrorKind::UniqueViolation => Self::AlreadyExists,
            StorageErrorKind::CheckViolation | StorageErrorKind::NotNullViolation => {
                Self::InvalidData
            }
            StorageErrorKind::Transient => Self::Transient(error),
            StorageErrorKind::ForeignKeyViolation | StorageErrorKind::Other => Self::Sql(error),
        }
    }
}
