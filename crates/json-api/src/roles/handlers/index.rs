//! Role Index Handler

use std::sync::Arc;

use salvo::prelude::*;

use nexus_app::auth::permissions::ROLE_READ;

use crate::{
    extensions::*,
    roles::{errors::into_status_error, models::RolesResponse},
    state::State,
};

/// Role Index Handler
#[endpoint(
    tags("roles"),
    summary = "List Roles",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Roles listed"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing role.read"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<RolesResponse>, StatusError> {
    let page = ListQuery::from_request(req)?.page_request()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(ROLE_READ)?;

    let roles = state
        .app
        .roles
        .list_roles(claims, page)
        .await
        .map_err(into_status_error)?;

    Ok(Json(roles.into()))
}
