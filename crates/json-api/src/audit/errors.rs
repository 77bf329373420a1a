//! Audit Errors

use salvo::http::StatusError;
use tracing::error;

use nexus_app::domain::audit::AuditServiceError;

pub(crate) fn into_status_error(error: AuditServiceError) -> StatusError {
    match error {
        AuditServiceError::InvalidRange => {
            StatusError::bad_request().brief("`from` must precede `to`")
        }
        AuditServiceError::Transient(source) | AuditServiceError::Sql(source) => {
            error!("audit storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
