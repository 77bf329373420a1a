//! Update Tenant Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{
    auth::permissions::TENANT_WRITE,
    domain::tenants::{data::TenantUpdate, records::TenantStatus},
};

use crate::{
    extensions::*,
    state::State,
    tenants::{errors::into_status_error, models::TenantResponse},
};

/// Update Tenant Request
///
/// Absent fields are left unchanged.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateTenantRequest {
    pub name: Option<String>,

    /// `active` or `suspended`
    pub status: Option<String>,
}

impl UpdateTenantRequest {
    fn into_update(self) -> Result<TenantUpdate, StatusError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<TenantStatus>)
            .transpose()
            .or_400("Invalid tenant status")?;

        Ok(TenantUpdate {
            name: self.name,
            status,
        })
    }
}

/// Update Tenant Handler
#[endpoint(
    tags("tenants"),
    summary = "Update Tenant",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Tenant updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Tenant not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid status transition"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    json: JsonBody<UpdateTenantRequest>,
    depot: &mut Depot,
) -> Result<Json<TenantResponse>, StatusError> {
    let update = json.into_inner().into_update()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(TENANT_WRITE)?;

    let tenant = state
        .app
        .tenants
        .update_tenant(claims, uuid.into_inner().into(), update)
        .await
        .map_err(into_status_error)?;

    Ok(Json(tenant.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use nexus_app::domain::tenants::{TenantsServiceError, records::TenantRecord};

    use crate::test_helpers::{TEST_TENANT_UUID, TestApp};

    use super::{super::tests::*, *};

    fn make_service(app: TestApp) -> Service {
        app.service(
            &["tenant.write"],
            Router::with_path("tenants/{uuid}").put(handler).patch(handler),
        )
    }

    #[tokio::test]
    async fn test_suspend_tenant() -> TestResult {
        let mut app = TestApp::default();

        app.tenants
            .expect_update_tenant()
            .once()
            .withf(|_, tenant, update| {
                *tenant == TEST_TENANT_UUID
                    && *update
                        == TenantUpdate {
                            name: None,
                            status: Some(TenantStatus::Suspended),
                        }
            })
            .return_once(|_, uuid, _| {
                Ok(TenantRecord {
                    status: TenantStatus::Suspended,
                    ..make_tenant(uuid)
                })
            });

        let mut res = TestClient::patch(format!("http://example.com/tenants/{TEST_TENANT_UUID}"))
            .json(&json!({ "status": "suspended" }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: TenantResponse = res.take_json().await?;

        assert_eq!(body.status, "suspended");

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.tenants.expect_update_tenant().never();

        let res = TestClient::put(format!("http://example.com/tenants/{TEST_TENANT_UUID}"))
            .json(&json!({ "status": "paused" }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_status_returns_422() -> TestResult {
        let mut app = TestApp::default();

        app.tenants
            .expect_update_tenant()
            .once()
            .return_once(|_, _, _| Err(TenantsServiceError::InvalidTransition));

        let res = TestClient::put(format!("http://example.com/tenants/{TEST_TENANT_UUID}"))
            .json(&json!({ "status": "deleted" }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }
}
