//! Issue API Key Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use nexus_app::{auth::permissions::API_KEY_WRITE, domain::api_keys::data::NewApiKey};

use crate::{
    api_keys::{errors::into_status_error, models::IssuedApiKeyResponse},
    extensions::*,
    state::State,
};

/// Issue API Key Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateApiKeyRequest {
    pub name: String,

    /// Subset of the caller's own permissions
    #[serde(default)]
    pub scopes: Vec<String>,

    /// RFC 3339 instant; defaults to ninety days from now
    #[serde(default, alias = "expires_at")]
    pub expires_at: Option<String>,
}

impl CreateApiKeyRequest {
    fn into_new_api_key(self) -> Result<NewApiKey, StatusError> {
        Ok(NewApiKey {
            expires_at: parse_optional_timestamp("expiresAt", self.expires_at.as_deref())?,
            name: self.name,
            scopes: self.scopes.into_iter().collect(),
        })
    }
}

/// Issue API Key Handler
///
/// The plaintext key is in this response only.
#[endpoint(
    tags("api-keys"),
    summary = "Issue API Key",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "API key issued"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing api_key.write or scope escalation"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateApiKeyRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<IssuedApiKeyResponse>, StatusError> {
    let new_key = json.into_inner().into_new_api_key()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(API_KEY_WRITE)?;

    let issued = state
        .app
        .api_keys
        .issue_api_key(claims, new_key)
        .await
        .map_err(into_status_error)?;

    res.add_header(
        LOCATION,
        format!("/api/v1/api-keys/{}", issued.record.uuid),
        true,
    )
    .or_500("failed to set location header")?
    .status_code(StatusCode::CREATED);

    Ok(Json(issued.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use nexus_app::domain::api_keys::{
        ApiKeysServiceError, data::IssuedApiKey, records::ApiKeyUuid,
    };

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    fn make_service(app: TestApp) -> Service {
        app.service(&["api_key.write"], Router::with_path("api-keys").post(handler))
    }

    #[tokio::test]
    async fn test_issue_returns_plaintext_once() -> TestResult {
        let uuid = ApiKeyUuid::new();

        let mut app = TestApp::default();

        app.api_keys
            .expect_issue_api_key()
            .once()
            .withf(|_, key| {
                key.name == "ci"
                    && key.scopes.allows("sheets.read")
                    && key.expires_at.map(jiff::Timestamp::as_second) == Some(1_893_456_000)
            })
            .return_once(move |_, _| {
                Ok(IssuedApiKey {
                    key: "nxab12cd34.0123".to_string(),
                    record: make_api_key(uuid),
                })
            });

        let mut res = TestClient::post("http://example.com/api-keys")
            .json(&json!({
                "name": "ci",
                "scopes": ["sheets.read"],
                "expiresAt": "2030-01-01T00:00:00Z",
            }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        let body: Value = res.take_json().await?;

        assert_eq!(body["key"], "nxab12cd34.0123");
        assert_eq!(body["prefix"], "nxab12cd34");
        assert_eq!(body["id"], uuid.to_string());

        Ok(())
    }

    #[tokio::test]
    async fn test_unparseable_expiry_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.api_keys.expect_issue_api_key().never();

        let res = TestClient::post("http://example.com/api-keys")
            .json(&json!({ "name": "ci", "scopes": ["sheets.read"], "expiresAt": "soon" }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_scopes_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.api_keys
            .expect_issue_api_key()
            .once()
            .return_once(|_, _| Err(ApiKeysServiceError::NoScopes));

        let res = TestClient::post("http://example.com/api-keys")
            .json(&json!({ "name": "ci", "scopes": [] }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_scope_escalation_returns_403() -> TestResult {
        let mut app = TestApp::default();

        app.api_keys
            .expect_issue_api_key()
            .once()
            .return_once(|_, _| Err(ApiKeysServiceError::EscalatesPrivileges));

        let res = TestClient::post("http://example.com/api-keys")
            .json(&json!({ "name": "ci", "scopes": ["tenant.delete"] }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
