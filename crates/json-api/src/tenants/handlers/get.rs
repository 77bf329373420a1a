//! Get Tenant Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::TENANT_READ;

use crate::{
    extensions::*,
    state::State,
    tenants::{errors::into_status_error, models::TenantResponse},
};

/// Get Tenant Handler
#[endpoint(
    tags("tenants"),
    summary = "Get Tenant",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Tenant found"),
        (status_code = StatusCode::NOT_FOUND, description = "Tenant not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<TenantResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(TENANT_READ)?;

    let tenant = state
        .app
        .tenants
        .get_tenant(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(tenant.into()))
}
