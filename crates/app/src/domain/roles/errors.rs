//! Roles service errors.

use sqlx::Error;
use thiserror::Error;

use crate::database::{StorageErrorKind, classify};

#[derive(Debug, Error)]
pub enum RolesServiceError {
    #[error("role name already in use")]
    AlreadyExists,

    #[error("role not found")]
    NotFound,

    #[error("invalid permission `{0}`")]
    InvalidPermission(String),

    #[error("role grants permissions the caller does not hold")]
    EscalatesPrivileges,

    #[error("invalid role data")]
    InvalidData,

    #[error("storage temporarily unavailable")]
    Transient(#[source] Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for RolesServiceError {
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
