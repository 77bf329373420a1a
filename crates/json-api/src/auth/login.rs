//! Login Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::domain::users::data::Credentials;

use crate::{
    auth::{errors::login_error, models::TokenResponse},
    extensions::*,
    state::State,
};

/// Login Request
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest {
    pub email: String,
    pub password: String,

    /// Needed only when the email is registered in more than one tenant.
    #[serde(default, alias = "tenant_id")]
    pub tenant_id: Option<Uuid>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

impl From<LoginRequest> for Credentials {
    fn from(request: LoginRequest) -> Self {
        Credentials {
            email: request.email,
            password: request.password,
            tenant: request.tenant_id.map(Into::into),
        }
    }
}

/// Login Handler
///
/// Exchanges email and password for a bearer token.
#[endpoint(
    tags("auth"),
    summary = "Log In",
    responses(
        (status_code = StatusCode::OK, description = "Token issued"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Invalid credentials"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<LoginRequest>,
    depot: &mut Depot,
) -> Result<Json<TokenResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let authenticated = state
        .app
        .users
        .authenticate(json.into_inner().into())
        .await
        .map_err(login_error)?;

    let issued = state
        .app
        .tokens
        .issue(
            authenticated.user.uuid,
            authenticated.user.tenant,
            &authenticated.user.email,
            &authenticated.permissions,
        )
        .or_500("failed to issue token")?;

    Ok(Json(TokenResponse::new(
        issued,
        &authenticated.user,
        authenticated.permissions,
    )))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use nexus_app::{
        auth::Permissions,
        domain::users::{
            UsersServiceError,
            data::AuthenticatedUser,
            records::{UserRecord, UserStatus},
        },
    };

    use crate::test_helpers::{TEST_TENANT_UUID, TEST_USER_UUID, TestApp, test_tokens};

    use super::*;

    fn make_service(app: TestApp) -> Service {
        app.anonymous(Router::with_path("auth/login").post(handler))
    }

    fn authenticated() -> AuthenticatedUser {
        AuthenticatedUser {
            user: UserRecord {
                uuid: TEST_USER_UUID,
                tenant: TEST_TENANT_UUID,
                email: "alice@t.example".to_string(),
                display_name: "Alice".to_string(),
                status: UserStatus::Active,
                roles: Vec::new(),
                created_at: Timestamp::UNIX_EPOCH,
                updated_at: Timestamp::UNIX_EPOCH,
                deleted_at: None,
            },
            permissions: ["user.read", "sheets.read"].into_iter().collect::<Permissions>(),
        }
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() -> TestResult {
        let mut app = TestApp::default();

        app.users
            .expect_authenticate()
            .once()
            .withf(|credentials| {
                credentials.email == "alice@t.example"
                    && credentials.password == "Secr3t!pass"
                    && credentials.tenant == Some(TEST_TENANT_UUID)
            })
            .return_once(|_| Ok(authenticated()));

        let mut res = TestClient::post("http://example.com/auth/login")
            .json(&json!({
                "email": "alice@t.example",
                "password": "Secr3t!pass",
                "tenantId": TEST_TENANT_UUID.into_uuid(),
            }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: TokenResponse = res.take_json().await?;
        let claims = test_tokens().verify(&body.token)?;

        assert_eq!(body.token_type, "Bearer");
        assert_eq!(body.tenant_id, TEST_TENANT_UUID.into_uuid());
        assert_eq!(claims.subject, TEST_USER_UUID);
        assert!(claims.allows("sheets.read"));
        assert!(!claims.allows("sheets.write"));

        Ok(())
    }

    #[tokio::test]
    async fn test_bad_credentials_return_401() -> TestResult {
        let mut app = TestApp::default();

        app.users
            .expect_authenticate()
            .once()
            .return_once(|_| Err(UsersServiceError::InvalidCredentials));

        let res = TestClient::post("http://example.com/auth/login")
            .json(&json!({ "email": "alice@t.example", "password": "wrong" }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_password_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.users.expect_authenticate().never();

        let res = TestClient::post("http://example.com/auth/login")
            .json(&json!({ "email": "alice@t.example" }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
