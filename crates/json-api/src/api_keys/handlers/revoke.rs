//! Revoke API Key Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::API_KEY_WRITE;

use crate::{
    api_keys::{errors::into_status_error, models::ApiKeyResponse},
    extensions::*,
    state::State,
};

/// Revoke API Key Handler
///
/// Revocation is permanent and takes effect on the next request.
#[endpoint(
    tags("api-keys"),
    summary = "Revoke API Key",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "API key revoked"),
        (status_code = StatusCode::NOT_FOUND, description = "API key not found"),
        (status_code = StatusCode::CONFLICT, description = "API key already revoked"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<ApiKeyResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(API_KEY_WRITE)?;

    let key = state
        .app
        .api_keys
        .revoke_api_key(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(key.into()))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use nexus_app::domain::api_keys::{
        ApiKeysServiceError,
        records::{ApiKeyRecord, ApiKeyStatus, ApiKeyUuid},
    };

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    fn make_service(app: TestApp) -> Service {
        app.service(
            &["api_key.write"],
            Router::with_path("api-keys/{uuid}")
                .delete(handler)
                .push(Router::with_path("revoke").post(handler)),
        )
    }

    #[tokio::test]
    async fn test_revoke_via_post_and_delete() -> TestResult {
        let uuid = ApiKeyUuid::new();

        let mut app = TestApp::default();

        app.api_keys
            .expect_revoke_api_key()
            .times(2)
            .withf(move |_, key| *key == uuid)
            .returning(move |_, _| {
                Ok(ApiKeyRecord {
                    status: ApiKeyStatus::Revoked,
                    revoked_at: Some(Timestamp::UNIX_EPOCH),
                    ..make_api_key(uuid)
                })
            });

        let service = make_service(app);

        let mut res = TestClient::post(format!("http://example.com/api-keys/{uuid}/revoke"))
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: ApiKeyResponse = res.take_json().await?;

        assert_eq!(body.status, "revoked");
        assert!(body.revoked_at.is_some());

        let res = TestClient::delete(format!("http://example.com/api-keys/{uuid}"))
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        Ok(())
    }

    #[tokio::test]
    async fn test_second_revoke_returns_409() -> TestResult {
        let mut app = TestApp::default();

        app.api_keys
            .expect_revoke_api_key()
            .once()
            .return_once(|_, _| Err(ApiKeysServiceError::AlreadyRevoked));

        let res = TestClient::delete(format!("http://example.com/api-keys/{}", ApiKeyUuid::new()))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
