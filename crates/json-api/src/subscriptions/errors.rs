//! Subscription Errors

use salvo::http::StatusError;
use tracing::error;

use nexus_app::domain::subscriptions::SubscriptionsServiceError;

pub(crate) fn into_status_error(error: SubscriptionsServiceError) -> StatusError {
    match error {
        SubscriptionsServiceError::AlreadyActive => {
            StatusError::conflict().brief("Tenant already has an active subscription")
        }
        SubscriptionsServiceError::NotFound => {
            StatusError::not_found().brief("Subscription not found")
        }
        SubscriptionsServiceError::NotActive => {
            StatusError::conflict().brief("Subscription is not active")
        }
        SubscriptionsServiceError::InvalidTransition => StatusError::unprocessable_entity()
            .brief("Subscription cannot change from its current status"),
        SubscriptionsServiceError::InvalidPeriod => StatusError::bad_request()
            .brief("Period end must be after period start and in the future"),
        SubscriptionsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid subscription payload")
        }
        SubscriptionsServiceError::Transient(source) | SubscriptionsServiceError::Sql(source) => {
            error!("subscription storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
