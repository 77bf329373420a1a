//! Cancel Subscription Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::SUBSCRIPTION_WRITE;

use crate::{
    extensions::*,
    state::State,
    subscriptions::{errors::into_status_error, models::SubscriptionResponse},
};

/// Cancel Subscription Handler
#[endpoint(
    tags("subscriptions"),
    summary = "Cancel Subscription",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Subscription cancelled"),
        (status_code = StatusCode::NOT_FOUND, description = "Subscription not found"),
        (status_code = StatusCode::CONFLICT, description = "Subscription is not active"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<SubscriptionResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SUBSCRIPTION_WRITE)?;

    let subscription = state
        .app
        .subscriptions
        .cancel_subscription(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(subscription.into()))
}
