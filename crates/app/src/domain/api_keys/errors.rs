//! API keys service errors.

use sqlx::Error;
use thiserror::Error;

use crate::database::{StorageErrorKind, classify};

#[derive(Debug, Error)]
pub enum ApiKeysServiceError {
    #[error("api key not found")]
    NotFound,

    #[error("api key is already revoked")]
    AlreadyRevoked,

    #[error("invalid scope `{0}`")]
    InvalidScope(String),

    #[error("an api key needs at least one scope")]
    NoScopes,

    #[error("scopes exceed the caller's permissions")]
    EscalatesPrivileges,

    #[error("expiry must be in the future")]
    InvalidExpiry,

    #[error("invalid api key")]
    InvalidKey,

    #[error("invalid api key data")]
    InvalidData,

    #[error("storage temporarily unavailable")]
    Transient(#[source] Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ApiKeysServiceError {
    fn from(error: Error) -> Self {
        match classify(&error) {
            StorageErrorKind::NotFound => Self::NotFound,
            StorageErrorKind::CheckViolation
            | StorageErrorKind::NotNullViolation
            | StorageErrorKind::ForeignKeyViolation => Self::InvalidData,
            StorageErrorKind::Transient => Self::Transient(error),
            StorageErrorKind::UniqueViolation | StorageErrorKind::Other => Self::Sql(error),
        }
    }
}
