//! Create Subscription Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use nexus_app::{
    auth::permissions::SUBSCRIPTION_WRITE, domain::subscriptions::data::NewSubscription,
};

use crate::{
    extensions::*,
    state::State,
    subscriptions::{errors::into_status_error, models::SubscriptionResponse},
};

/// Create Subscription Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateSubscriptionRequest {
    pub plan: String,

    /// RFC 3339 instant
    #[serde(alias = "periodStart")]
    pub period_start: String,

    /// RFC 3339 instant, after `period_start`
    #[serde(alias = "periodEnd")]
    pub period_end: String,
}

impl CreateSubscriptionRequest {
    fn into_new_subscription(self) -> Result<NewSubscription, StatusError> {
        Ok(NewSubscription {
            period_start: parse_timestamp("period_start", &self.period_start)?,
            period_end: parse_timestamp("period_end", &self.period_end)?,
            plan: self.plan,
        })
    }
}

/// Create Subscription Handler
#[endpoint(
    tags("subscriptions"),
    summary = "Create Subscription",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Subscription created"),
        (status_code = StatusCode::CONFLICT, description = "Tenant already has an active subscription"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateSubscriptionRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<SubscriptionResponse>, StatusError> {
    let new_subscription = json.into_inner().into_new_subscription()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SUBSCRIPTION_WRITE)?;

    let subscription = state
        .app
        .subscriptions
        .create_subscription(claims, new_subscription)
        .await
        .map_err(into_status_error)?;

    res.add_header(
        LOCATION,
        format!("/api/v1/subscriptions/{}", subscription.uuid),
        true,
    )
    .or_500("failed to set location header")?
    .status_code(StatusCode::CREATED);

    Ok(Json(subscription.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use nexus_app::domain::subscriptions::{
        SubscriptionsServiceError, records::SubscriptionUuid,
    };

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    fn make_service(app: TestApp) -> Service {
        app.service(
            &["subscription.write"],
            Router::with_path("subscriptions").post(handler),
        )
    }

    #[tokio::test]
    async fn test_create_subscription_success() -> TestResult {
        let uuid = SubscriptionUuid::new();

        let mut app = TestApp::default();

        app.subscriptions
            .expect_create_subscription()
            .once()
            .withf(|_, subscription| {
                subscription.plan == "pro"
                    && subscription.period_start.as_second() == 1_767_225_600
                    && subscription.period_end.as_second() == 1_893_456_000
            })
            .return_once(move |_, _| Ok(make_subscription(uuid)));

        let mut res = TestClient::post("http://example.com/subscriptions")
            .json(&json!({
                "plan": "pro",
                "period_start": "2026-01-01T00:00:00Z",
                "period_end": "2030-01-01T00:00:00Z",
            }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        let body: SubscriptionResponse = res.take_json().await?;

        assert_eq!(body.id, uuid.into_uuid());
        assert_eq!(body.status, "active");

        Ok(())
    }

    #[tokio::test]
    async fn test_second_active_subscription_returns_409() -> TestResult {
        let mut app = TestApp::default();

        app.subscriptions
            .expect_create_subscription()
            .once()
            .return_once(|_, _| Err(SubscriptionsServiceError::AlreadyActive));

        let res = TestClient::post("http://example.com/subscriptions")
            .json(&json!({
                "plan": "pro",
                "periodStart": "2026-01-01T00:00:00Z",
                "periodEnd": "2030-01-01T00:00:00Z",
            }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_inverted_period_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.subscriptions
            .expect_create_subscription()
            .once()
            .return_once(|_, _| Err(SubscriptionsServiceError::InvalidPeriod));

        let res = TestClient::post("http://example.com/subscriptions")
            .json(&json!({
                "plan": "pro",
                "period_start": "2030-01-01T00:00:00Z",
                "period_end": "2026-01-01T00:00:00Z",
            }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
