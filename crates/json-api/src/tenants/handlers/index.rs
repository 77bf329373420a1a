//! Tenant Index Handler

use std::sync::Arc;

use salvo::prelude::*;

use nexus_app::auth::permissions::TENANT_READ;

use crate::{
    extensions::*,
    state::State,
    tenants::{errors::into_status_error, models::TenantsResponse},
};

/// Tenant Index Handler
///
/// Lists the tenants visible to the caller, which is only their own.
#[endpoint(
    tags("tenants"),
    summary = "List Tenants",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Tenants listed"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing tenant.read"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<TenantsResponse>, StatusError> {
    let page = ListQuery::from_request(req)?.page_request()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(TENANT_READ)?;

    let tenants = state
        .app
        .tenants
        .list_tenants(claims, page)
        .await
        .map_err(into_status_error)?;

    Ok(Json(tenants.into()))
}
