//! Tenants service errors.

use sqlx::Error;
use thiserror::Error;

use crate::{
    auth::{PasswordError, PasswordPolicyError},
    database::{StorageErrorKind, classify},
};

#[derive(Debug, Error)]
pub enum TenantsServiceError {
    #[error("tenant already exists")]
    AlreadyExists,

    #[error("tenant not found")]
    NotFound,

    #[error("invalid tenant data")]
    InvalidData,

    #[error("tenants are deleted with delete, not by status")]
    InvalidTransition,

    #[error("invalid email address")]
    InvalidEmail,

    #[error(transparent)]
    WeakPassword(#[from] PasswordPolicyError),

    #[error("password hashing failed")]
    Password(#[from] PasswordError),

    #[error("storage temporarily unavailable")]
    Transient(#[source] Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for TenantsServiceError {
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
