//! API Key Index Handler

use std::sync::Arc;

use salvo::prelude::*;

use nexus_app::auth::permissions::API_KEY_READ;

use crate::{
    api_keys::{errors::into_status_error, models::ApiKeysResponse},
    extensions::*,
    state::State,
};

/// API Key Index Handler
#[endpoint(
    tags("api-keys"),
    summary = "List API Keys",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "API keys listed"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing api_key.read"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<ApiKeysResponse>, StatusError> {
    let page = ListQuery::from_request(req)?.page_request()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(API_KEY_READ)?;

    let keys = state
        .app
        .api_keys
        .list_api_keys(claims, page)
        .await
        .map_err(into_status_error)?;

    Ok(Json(keys.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use nexus_app::{domain::api_keys::records::ApiKeyUuid, pagination::Page};

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    #[tokio::test]
    async fn test_list_api_keys_success() -> TestResult {
        let mut app = TestApp::default();

        app.api_keys
            .expect_list_api_keys()
            .once()
            .return_once(|_, page| {
                Ok(Page::new(
                    vec![make_api_key(ApiKeyUuid::new()), make_api_key(ApiKeyUuid::new())],
                    &page,
                    2,
                ))
            });

        let mut res = TestClient::get("http://example.com/api-keys")
            .send(&app.service(&["api_key.read"], Router::with_path("api-keys").get(handler)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: ApiKeysResponse = res.take_json().await?;

        assert_eq!(body.items.len(), 2);
        assert_eq!(body.page, 1);

        Ok(())
    }
}
