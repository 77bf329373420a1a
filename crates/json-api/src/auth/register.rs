//! Registration Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use nexus_app::domain::tenants::data::NewRegistration;

use crate::{
    auth::models::TokenResponse, extensions::*, state::State,
    tenants::errors::into_status_error,
};

/// Registration Request
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest {
    #[serde(alias = "tenant_name")]
    pub tenant_name: String,

    pub email: String,
    pub password: String,

    #[serde(default, alias = "display_name")]
    pub display_name: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("tenant_name", &self.tenant_name)
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl From<RegisterRequest> for NewRegistration {
    fn from(request: RegisterRequest) -> Self {
        NewRegistration {
            tenant_name: request.tenant_name,
            email: request.email,
            password: request.password,
            display_name: request.display_name,
        }
    }
}

/// Registration Handler
///
/// Creates a tenant with an administrator and signs that administrator in.
#[endpoint(
    tags("auth"),
    summary = "Register Tenant",
    responses(
        (status_code = StatusCode::CREATED, description = "Tenant registered"),
        (status_code = StatusCode::CONFLICT, description = "Tenant already exists"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<RegisterRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<TokenResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let registration = state
        .app
        .tenants
        .register(json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    let issued = state
        .app
        .tokens
        .issue(
            registration.user.uuid,
            registration.tenant.uuid,
            &registration.user.email,
            &registration.permissions,
        )
        .or_500("failed to issue token")?;

    res.add_header(
        LOCATION,
        format!("/api/v1/tenants/{}", registration.tenant.uuid),
        true,
    )
    .or_500("failed to set location header")?
    .status_code(StatusCode::CREATED);

    Ok(Json(TokenResponse::new(
        issued,
        &registration.user,
        registration.permissions,
    )))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use nexus_app::{
        auth::{PasswordPolicyError, PasswordRule, Permissions},
        domain::{
            roles::records::{RoleRecord, RoleUuid},
            tenants::{
                TenantsServiceError,
                data::Registration,
                records::{TenantRecord, TenantStatus},
            },
            users::records::{UserRecord, UserStatus},
        },
    };

    use crate::test_helpers::{TEST_TENANT_UUID, TEST_USER_UUID, TestApp, test_tokens};

    use super::*;

    fn make_service(app: TestApp) -> Service {
        app.anonymous(Router::with_path("auth/register").post(handler))
    }

    fn registration() -> Registration {
        let role = RoleUuid::new();

        Registration {
            tenant: TenantRecord {
                uuid: TEST_TENANT_UUID,
                name: "Acme".to_string(),
                status: TenantStatus::Active,
                created_at: Timestamp::UNIX_EPOCH,
                updated_at: Timestamp::UNIX_EPOCH,
                deleted_at: None,
            },
            role: RoleRecord {
                uuid: role,
                tenant: TEST_TENANT_UUID,
                name: "admin".to_string(),
                permissions: ["*"].into_iter().collect(),
                created_at: Timestamp::UNIX_EPOCH,
                updated_at: Timestamp::UNIX_EPOCH,
            },
            user: UserRecord {
                uuid: TEST_USER_UUID,
                tenant: TEST_TENANT_UUID,
                email: "owner@acme.example".to_string(),
                display_name: "Owner".to_string(),
                status: UserStatus::Active,
                roles: vec![role],
                created_at: Timestamp::UNIX_EPOCH,
                updated_at: Timestamp::UNIX_EPOCH,
                deleted_at: None,
            },
            permissions: ["*"].into_iter().collect::<Permissions>(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_tenant_and_signs_in() -> TestResult {
        let mut app = TestApp::default();

        app.tenants
            .expect_register()
            .once()
            .withf(|new| {
                new.tenant_name == "Acme"
                    && new.email == "owner@acme.example"
                    && new.display_name == "Owner"
            })
            .return_once(|_| Ok(registration()));

        let mut res = TestClient::post("http://example.com/auth/register")
            .json(&json!({
                "tenantName": "Acme",
                "email": "owner@acme.example",
                "password": "Secr3t!pass",
                "displayName": "Owner",
            }))
            .send(&make_service(app))
            .await;

        let location = res
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(
            location,
            Some(format!("/api/v1/tenants/{TEST_TENANT_UUID}"))
        );

        let body: TokenResponse = res.take_json().await?;
        let claims = test_tokens().verify(&body.token)?;

        assert_eq!(claims.tenant, TEST_TENANT_UUID);
        assert!(claims.permissions.is_wildcard());

        Ok(())
    }

    #[tokio::test]
    async fn test_weak_password_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.tenants.expect_register().once().return_once(|_| {
            Err(TenantsServiceError::WeakPassword(PasswordPolicyError {
                violations: vec![PasswordRule::Digit, PasswordRule::Symbol],
            }))
        });

        let res = TestClient::post("http://example.com/auth/register")
            .json(&json!({
                "tenantName": "Acme",
                "email": "owner@acme.example",
                "password": "password",
            }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_email_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.tenants
            .expect_register()
            .once()
            .return_once(|_| Err(TenantsServiceError::InvalidEmail));

        let res = TestClient::post("http://example.com/auth/register")
            .json(&json!({
                "tenantName": "Acme",
                "email": "not-an-email",
                "password": "Secr3t!pass",
            }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
