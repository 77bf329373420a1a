//! Users service errors.

use sqlx::Error;
use thiserror::Error;

use crate::{
    auth::{PasswordError, PasswordPolicyError},
    database::{StorageErrorKind, classify},
};

#[derive(Debug, Error)]
pub enum UsersServiceError {
    #[error("email already registered in this tenant")]
    DuplicateEmail,

    #[error("user not found")]
    NotFound,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("role does not exist in this tenant")]
    InvalidRole,

    #[error("roles grant permissions the caller does not hold")]
    EscalatesPrivileges,

    #[error("users are deleted with delete, not by status")]
    InvalidTransition,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    WeakPassword(#[from] PasswordPolicyError),

    #[error("password hashing failed")]
    Password(#[from] PasswordError),

    #[error("invalid user data")]
    InvalidData,

    #[error("storage temporarily unavailable")]
    Transient(#[source] Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for UsersServiceError {
    fn from(error: Error) -> Self {
        match classify(&error) {
            StorageErrorKind::NotFound => Self::NotFound,
            StorageErrorKind::UniqueViolation => Self::DuplicateEmail,
            StorageErrorKind::ForeignKeyViolation => Self::InvalidRole,
            StorageErrorKind::CheckViolation | StorageErrorKind::NotNullViolation => {
                Self::InvalidData
            }
            StorageErrorKind::Transient => Self::Transient(error),
            StorageErrorKind::Other => Self::Sql(error),
        }
    }
}
