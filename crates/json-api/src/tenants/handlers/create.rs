//! Create Tenant Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use nexus_app::{auth::permissions::TENANT_CREATE, domain::tenants::data::NewTenant};

use crate::{
    extensions::*,
    state::State,
    tenants::{errors::into_status_error, models::TenantResponse},
};

/// Create Tenant Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateTenantRequest {
    pub name: String,
}

impl From<CreateTenantRequest> for NewTenant {
    fn from(request: CreateTenantRequest) -> Self {
        NewTenant { name: request.name }
    }
}

/// Create Tenant Handler
#[endpoint(
    tags("tenants"),
    summary = "Create Tenant",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Tenant created"),
        (status_code = StatusCode::CONFLICT, description = "Tenant already exists"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing tenant.create"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateTenantRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<TenantResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(TENANT_CREATE)?;

    let tenant = state
        .app
        .tenants
        .create_tenant(claims, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/api/v1/tenants/{}", tenant.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(tenant.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use nexus_app::domain::tenants::{TenantsServiceError, records::TenantUuid};

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    fn make_service(app: TestApp) -> Service {
        app.service(&["tenant.create"], Router::with_path("tenants").post(handler))
    }

    #[tokio::test]
    async fn test_create_tenant_success() -> TestResult {
        let uuid = TenantUuid::new();

        let mut app = TestApp::default();

        app.tenants
            .expect_create_tenant()
            .once()
            .withf(|_, new| *new == NewTenant { name: "Acme".to_string() })
            .return_once(move |_, _| Ok(make_tenant(uuid)));

        let mut res = TestClient::post("http://example.com/tenants")
            .json(&json!({ "name": "Acme" }))
            .send(&make_service(app))
            .await;

        let location = res
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some(format!("/api/v1/tenants/{uuid}")));

        let body: TenantResponse = res.take_json().await?;

        assert_eq!(body.id, uuid.into_uuid());
        assert_eq!(body.status, "active");

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tenant_conflict_returns_409() -> TestResult {
        let mut app = TestApp::default();

        app.tenants
            .expect_create_tenant()
            .once()
            .return_once(|_, _| Err(TenantsServiceError::AlreadyExists));

        let res = TestClient::post("http://example.com/tenants")
            .json(&json!({ "name": "Acme" }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tenant_missing_name_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.tenants.expect_create_tenant().never();

        let res = TestClient::post("http://example.com/tenants")
            .json(&json!({}))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
