//! Authentication errors.

use salvo::http::StatusError;
use tracing::error;

use nexus_app::{
    auth::TokenError,
    domain::{api_keys::ApiKeysServiceError, users::UsersServiceError},
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub(crate) fn login_error(error: UsersServiceError) -> StatusError {
    match error {
        UsersServiceError::Transient(source) | UsersServiceError::Sql(source) => {
            error!("failed to authenticate user: {source}");

            StatusError::internal_server_error()
        }
        UsersServiceError::Password(source) => {
            error!("failed to verify password: {source}");

            StatusError::internal_server_error()
        }
        UsersServiceError::InvalidCredentials
        | UsersServiceError::NotFound
        | UsersServiceError::InvalidEmail
        | UsersServiceError::InvalidData
        | UsersServiceError::DuplicateEmail
        | UsersServiceError::InvalidRole
        | UsersServiceError::EscalatesPrivileges
        | UsersServiceError::InvalidTransition
        | UsersServiceError::WeakPassword(_) => {
            StatusError::unauthorized().brief(INVALID_CREDENTIALS)
        }
    }
}

pub(crate) fn api_key_error(error: ApiKeysServiceError) -> StatusError {
    match error {
        ApiKeysServiceError::Transient(source) | ApiKeysServiceError::Sql(source) => {
            error!("failed to look up api key: {source}");

            StatusError::internal_server_error()
        }
        ApiKeysServiceError::InvalidKey
        | ApiKeysServiceError::NotFound
        | ApiKeysServiceError::AlreadyRevoked
        | ApiKeysServiceError::InvalidScope(_)
        | ApiKeysServiceError::NoScopes
        | ApiKeysServiceError::EscalatesPrivileges
        | ApiKeysServiceError::InvalidExpiry
        | ApiKeysServiceError::InvalidData => StatusError::unauthorized().brief("Invalid API key"),
    }
}

pub(crate) fn token_error(error: &TokenError) -> StatusError {
    match error {
        TokenError::Expired => StatusError::unauthorized().brief("Token has expired"),
        TokenError::InvalidSignature
        | TokenError::Malformed
        | TokenError::MissingSecret
        | TokenError::InvalidLifetime
        | TokenError::Signing(_) => StatusError::unauthorized().brief("Invalid token"),
    }
}
