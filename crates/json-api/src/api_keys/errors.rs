//! API Key Errors

use salvo::http::StatusError;
use tracing::error;

use nexus_app::domain::api_keys::ApiKeysServiceError;

pub(crate) fn into_status_error(error: ApiKeysServiceError) -> StatusError {
    match error {
        ApiKeysServiceError::NotFound => StatusError::not_found().brief("API key not found"),
        ApiKeysServiceError::AlreadyRevoked => {
            StatusError::conflict().brief("API key is already revoked")
        }
        ApiKeysServiceError::InvalidScope(scope) => StatusError::bad_request()
            .brief("Invalid scope")
            .detail(format!("`{scope}` is not a valid permission")),
        ApiKeysServiceError::NoScopes => {
            StatusError::bad_request().brief("An API key needs at least one scope")
        }
        ApiKeysServiceError::InvalidExpiry => {
            StatusError::bad_request().brief("Expiry must be in the future")
        }
        ApiKeysServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid API key payload")
        }
        ApiKeysServiceError::EscalatesPrivileges => {
            StatusError::forbidden().brief("Scopes exceed the caller's permissions")
        }
        ApiKeysServiceError::InvalidKey => StatusError::unauthorized().brief("Invalid API key"),
        ApiKeysServiceError::Transient(source) | ApiKeysServiceError::Sql(source) => {
            error!("api key storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
