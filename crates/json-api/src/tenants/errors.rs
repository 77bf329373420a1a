//! Tenant Errors

use salvo::http::StatusError;
use tracing::error;

use nexus_app::domain::tenants::TenantsServiceError;

use crate::users::errors::weak_password;

pub(crate) fn into_status_error(error: TenantsServiceError) -> StatusError {
    match error {
        TenantsServiceError::AlreadyExists => StatusError::conflict().brief("Tenant already exists"),
        TenantsServiceError::NotFound => StatusError::not_found().brief("Tenant not found"),
        TenantsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid tenant payload")
        }
        TenantsServiceError::InvalidEmail => {
            StatusError::bad_request().brief("Invalid email address")
        }
        TenantsServiceError::WeakPassword(violations) => weak_password(&violations),
        TenantsServiceError::InvalidTransition => StatusError::unprocessable_entity()
            .brief("Tenants are deleted with DELETE, not by status"),
        TenantsServiceError::Password(source) => {
            error!("failed to hash tenant administrator password: {source}");

            StatusError::internal_server_error()
        }
        TenantsServiceError::Transient(source) | TenantsServiceError::Sql(source) => {
            error!("tenant storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
