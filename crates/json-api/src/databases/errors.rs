//! Database Instance Errors

use salvo::http::StatusError;
use tracing::error;

use nexus_app::domain::databases::DatabasesServiceError;

pub(crate) fn into_status_error(error: DatabasesServiceError) -> StatusError {
    match error {
        DatabasesServiceError::AlreadyExists => {
            StatusError::conflict().brief("A database with this name already exists")
        }
        DatabasesServiceError::NotFound => StatusError::not_found().brief("Database not found"),
        DatabasesServiceError::InvalidTransition { from, to } => {
            StatusError::unprocessable_entity()
                .brief("Invalid status transition")
                .detail(format!("cannot move database from {from} to {to}"))
        }
        DatabasesServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid database payload")
        }
        DatabasesServiceError::Transient(source) | DatabasesServiceError::Sql(source) => {
            error!("database instance storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
