//! Create Role Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use nexus_app::{auth::permissions::ROLE_WRITE, domain::roles::data::NewRole};

use crate::{
    extensions::*,
    roles::{errors::into_status_error, models::RoleResponse},
    state::State,
};

/// Create Role Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateRoleRequest {
    pub name: String,

    /// Permission strings such as `user.read`, or `*`
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl From<CreateRoleRequest> for NewRole {
    fn from(request: CreateRoleRequest) -> Self {
        NewRole {
            name: request.name,
            permissions: request.permissions.into_iter().collect(),
        }
    }
}

/// Create Role Handler
#[endpoint(
    tags("roles"),
    summary = "Create Role",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Role created"),
        (status_code = StatusCode::CONFLICT, description = "Role name already in use"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing role.write or privilege escalation"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateRoleRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<RoleResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(ROLE_WRITE)?;

    let role = state
        .app
        .roles
        .create_role(claims, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/api/v1/roles/{}", role.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(role.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use nexus_app::domain::roles::{RolesServiceError, records::RoleUuid};

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    fn make_service(app: TestApp) -> Service {
        app.service(&["role.write"], Router::with_path("roles").post(handler))
    }

    #[tokio::test]
    async fn test_create_role_success() -> TestResult {
        let uuid = RoleUuid::new();

        let mut app = TestApp::default();

        app.roles
            .expect_create_role()
            .once()
            .withf(|_, role| {
                role.name == "editor"
                    && role.permissions.allows("sheets.read")
                    && role.permissions.allows("sheets.write")
            })
            .return_once(move |_, _| Ok(make_role(uuid)));

        let mut res = TestClient::post("http://example.com/roles")
            .json(&json!({ "name": "editor", "permissions": ["sheets.read", "sheets.write"] }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(
            res.headers().get("location").and_then(|v| v.to_str().ok()),
            Some(format!("/api/v1/roles/{uuid}").as_str())
        );

        let body: RoleResponse = res.take_json().await?;

        assert_eq!(body.permissions.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_permission_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.roles
            .expect_create_role()
            .once()
            .return_once(|_, _| Err(RolesServiceError::InvalidPermission("user read".to_string())));

        let mut res = TestClient::post("http://example.com/roles")
            .json(&json!({ "name": "broken", "permissions": ["user read"] }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
        assert!(res.take_string().await?.contains("Invalid permission"));

        Ok(())
    }

    #[tokio::test]
    async fn test_escalation_returns_403() -> TestResult {
        let mut app = TestApp::default();

        app.roles
            .expect_create_role()
            .once()
            .return_once(|_, _| Err(RolesServiceError::EscalatesPrivileges));

        let res = TestClient::post("http://example.com/roles")
            .json(&json!({ "name": "root", "permissions": ["*"] }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }
}
