//! Role Errors

use salvo::http::StatusError;
use tracing::error;

use nexus_app::domain::roles::RolesServiceError;

pub(crate) fn into_status_error(error: RolesServiceError) -> StatusError {
    match error {
        RolesServiceError::AlreadyExists => StatusError::conflict().brief("Role name already in use"),
        RolesServiceError::NotFound => StatusError::not_found().brief("Role not found"),
        RolesServiceError::InvalidPermission(permission) => StatusError::bad_request()
            .brief("Invalid permission")
            .detail(format!("`{permission}` is not a valid permission")),
        RolesServiceError::InvalidData => StatusError::bad_request().brief("Invalid role payload"),
        RolesServiceError::EscalatesPrivileges => {
            StatusError::forbidden().brief("Role grants permissions the caller does not hold")
        }
        RolesServiceError::Transient(source) | RolesServiceError::Sql(source) => {
            error!("role storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
