//! Update Subscription Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{
    auth::permissions::SUBSCRIPTION_WRITE,
    domain::subscriptions::{data::SubscriptionUpdate, records::SubscriptionStatus},
};

use crate::{
    extensions::*,
    state::State,
    subscriptions::{errors::into_status_error, models::SubscriptionResponse},
};

/// Update Subscription Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateSubscriptionRequest {
    pub plan: Option<String>,

    /// `active`, `cancelled` or `expired`
    pub status: Option<String>,

    #[serde(alias = "periodStart")]
    pub period_start: Option<String>,

    #[serde(alias = "periodEnd")]
    pub period_end: Option<String>,
}

impl UpdateSubscriptionRequest {
    fn into_update(self) -> Result<SubscriptionUpdate, StatusError> {
        Ok(SubscriptionUpdate {
            status: self
                .status
                .as_deref()
                .map(str::parse::<SubscriptionStatus>)
                .transpose()
                .or_400("Invalid subscription status")?,
            period_start: parse_optional_timestamp("period_start", self.period_start.as_deref())?,
            period_end: parse_optional_timestamp("period_end", self.period_end.as_deref())?,
            plan: self.plan,
        })
    }
}

/// Update Subscription Handler
///
/// Cancelled and expired subscriptions cannot be changed.
#[endpoint(
    tags("subscriptions"),
    summary = "Update Subscription",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Subscription updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Subscription not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Subscription is no longer active"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    json: JsonBody<UpdateSubscriptionRequest>,
    depot: &mut Depot,
) -> Result<Json<SubscriptionResponse>, StatusError> {
    let update = json.into_inner().into_update()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SUBSCRIPTION_WRITE)?;

    let subscription = state
        .app
        .subscriptions
        .update_subscription(claims, uuid.into_inner().into(), update)
        .await
        .map_err(into_status_error)?;

    Ok(Json(subscription.into()))
}
