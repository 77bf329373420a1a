//! User Errors

use salvo::http::StatusError;
use tracing::error;

use nexus_app::{auth::PasswordPolicyError, domain::users::UsersServiceError};

/// 400 listing every password rule that failed.
pub(crate) fn weak_password(violations: &PasswordPolicyError) -> StatusError {
    StatusError::bad_request()
        .brief("Password does not meet policy")
        .detail(violations.details().join("; "))
}

pub(crate) fn into_status_error(error: UsersServiceError) -> StatusError {
    match error {
        UsersServiceError::DuplicateEmail => {
            StatusError::conflict().brief("Email already registered in this tenant")
        }
        UsersServiceError::NotFound => StatusError::not_found().brief("User not found"),
        UsersServiceError::InvalidEmail => {
            StatusError::bad_request().brief("Invalid email address")
        }
        UsersServiceError::InvalidRole => {
            StatusError::bad_request().brief("Role does not exist in this tenant")
        }
        UsersServiceError::InvalidData => StatusError::bad_request().brief("Invalid user payload"),
        UsersServiceError::WeakPassword(violations) => weak_password(&violations),
        UsersServiceError::EscalatesPrivileges => {
            StatusError::forbidden().brief("Roles grant permissions the caller does not hold")
        }
        UsersServiceError::InvalidTransition => StatusError::unprocessable_entity()
            .brief("Users are deleted with DELETE, not by status"),
        UsersServiceError::InvalidCredentials => {
            StatusError::unauthorized().brief("Invalid credentials")
        }
        UsersServiceError::Password(source) => {
            error!("failed to hash user password: {source}");

            StatusError::internal_server_error()
        }
        UsersServiceError::Transient(source) | UsersServiceError::Sql(source) => {
            error!("user storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
