//! Subscriptions service errors.

use sqlx::Error;
use thiserror::Error;

use crate::database::{StorageErrorKind, classify};

#[derive(Debug, Error)]
pub enum SubscriptionsServiceError {
    #[error("tenant already has an active subscription")]
    AlreadyActive,

    #[error("subscription not found")]
    NotFound,

    #[error("subscription is not active")]
    NotActive,

    #[error("subscription cannot change from its current status")]
    InvalidTransition,

    #[error("period end must be after period start and in the future")]
    InvalidPeriod,

    #[error("invalid subscription data")]
    InvalidData,

    #[error("storage temporarily unavailable")]
    Transient(#[source] Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for SubscriptionsServiceError {
    fn from(error: Error) -> Self {
        match classify(&error) {
            StorageErrorKind::NotFound => Self::NotFound,
            StorageErrorKind::UniqueViolation => Self::AlreadyActive,
            StorageErrorKind::CheckViolation | StorageErrorKind::NotNullViolation => {
                Self::InvalidData
            }
            StorageErrorKind::Transient => Self::Transient(error),
            StorageErrorKind::ForeignKeyViolation | StorageErrorKind::Other => Self::Sql(error),
        }
    }
}
