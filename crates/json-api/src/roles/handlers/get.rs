//! Get Role Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::ROLE_READ;

use crate::{
    extensions::*,
    roles::{errors::into_status_error, models::RoleResponse},
    state::State,
};

/// Get Role Handler
#[endpoint(
    tags("roles"),
    summary = "Get Role",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Role found"),
        (status_code = StatusCode::NOT_FOUND, description = "Role not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<RoleResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(ROLE_READ)?;

    let role = state
        .app
        .roles
        .get_role(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(role.into()))
}
