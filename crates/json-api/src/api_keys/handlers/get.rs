//! Get API Key Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::API_KEY_READ;

use crate::{
    api_keys::{errors::into_status_error, models::ApiKeyResponse},
    extensions::*,
    state::State,
};

/// Get API Key Handler
#[endpoint(
    tags("api-keys"),
    summary = "Get API Key",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "API key found"),
        (status_code = StatusCode::NOT_FOUND, description = "API key not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ApiKeyResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(API_KEY_READ)?;

    let key = state
        .app
        .api_keys
        .get_api_key(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(key.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::Value;
    use testresult::TestResult;

    use nexus_app::domain::api_keys::{ApiKeysServiceError, records::ApiKeyUuid};

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    fn make_service(app: TestApp) -> Service {
        app.service(&["api_key.read"], Router::with_path("api-keys/{uuid}").get(handler))
    }

    #[tokio::test]
    async fn test_get_api_key_hides_secret() -> TestResult {
        let uuid = ApiKeyUuid::new();

        let mut app = TestApp::default();

        app.api_keys
            .expect_get_api_key()
            .once()
            .withf(move |_, key| *key == uuid)
            .return_once(move |_, _| Ok(make_api_key(uuid)));

        let mut res = TestClient::get(format!("http://example.com/api-keys/{uuid}"))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(body["status"], "active");
        assert!(body.get("key").is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_key_returns_404() -> TestResult {
        let mut app = TestApp::default();

        app.api_keys
            .expect_get_api_key()
            .once()
            .return_once(|_, _| Err(ApiKeysServiceError::NotFound));

        let res = TestClient::get(format!("http://example.com/api-keys/{}", ApiKeyUuid::new()))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
