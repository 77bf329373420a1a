//! Get Subscription Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::SUBSCRIPTION_READ;

use crate::{
    extensions::*,
    state::State,
    subscriptions::{errors::into_status_error, models::SubscriptionResponse},
};

/// Get Subscription Handler
#[endpoint(
    tags("subscriptions"),
    summary = "Get Subscription",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Subscription found"),
        (status_code = StatusCode::NOT_FOUND, description = "Subscription not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<SubscriptionResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SUBSCRIPTION_READ)?;

    let subscription = state
        .app
        .subscriptions
        .get_subscription(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(subscription.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use nexus_app::domain::subscriptions::{
        SubscriptionsServiceError, records::SubscriptionUuid,
    };

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    fn make_service(app: TestApp) -> Service {
        app.service(
            &["subscription.read"],
            Router::with_path("subscriptions/{uuid}").get(handler),
        )
    }

    #[tokio::test]
    async fn test_get_subscription_success() -> TestResult {
        let uuid = SubscriptionUuid::new();

        let mut app = TestApp::default();

        app.subscriptions
            .expect_get_subscription()
            .once()
            .withf(move |_, subscription| *subscription == uuid)
            .return_once(move |_, _| Ok(make_subscription(uuid)));

        let mut res = TestClient::get(format!("http://example.com/subscriptions/{uuid}"))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: SubscriptionResponse = res.take_json().await?;

        assert_eq!(body.plan, "pro");
        assert!(body.cancelled_at.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_subscription_returns_404() -> TestResult {
        let mut app = TestApp::default();

        app.subscriptions
            .expect_get_subscription()
            .once()
            .return_once(|_, _| Err(SubscriptionsServiceError::NotFound));

        let res = TestClient::get(format!(
            "http://example.com/subscriptions/{}",
            SubscriptionUuid::new()
        ))
        .send(&make_service(app))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
