//! Subscription Index Handler

use std::sync::Arc;

use salvo::prelude::*;

use nexus_app::auth::permissions::SUBSCRIPTION_READ;

use crate::{
    extensions::*,
    state::State,
    subscriptions::{errors::into_status_error, models::SubscriptionsResponse},
};

/// Subscription Index Handler
///
/// Includes cancelled and expired subscriptions.
#[endpoint(
    tags("subscriptions"),
    summary = "List Subscriptions",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Subscriptions listed"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing subscription.read"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<SubscriptionsResponse>, StatusError> {
    let page = ListQuery::from_request(req)?.page_request()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SUBSCRIPTION_READ)?;

    let subscriptions = state
        .app
        .subscriptions
        .list_subscriptions(claims, page)
        .await
        .map_err(into_status_error)?;

    Ok(Json(subscriptions.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use nexus_app::{domain::subscriptions::records::SubscriptionUuid, pagination::Page};

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    #[tokio::test]
    async fn test_list_subscriptions_success() -> TestResult {
        let mut app = TestApp::default();

        app.subscriptions
            .expect_list_subscriptions()
            .once()
            .return_once(|_, page| {
                Ok(Page::new(
                    vec![make_subscription(SubscriptionUuid::new())],
                    &page,
                    1,
                ))
            });

        let mut res = TestClient::get("http://example.com/subscriptions")
            .send(&app.service(
                &["subscription.read"],
                Router::with_path("subscriptions").get(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: SubscriptionsResponse = res.take_json().await?;

        assert_eq!(body.items.len(), 1);

        Ok(())
    }
}
