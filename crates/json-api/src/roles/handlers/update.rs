//! Update Role Handler

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

use nexus_app::{auth::permissions::ROLE_WRITE, domain::roles::data::RoleUpdate};

use crate::{
    extensions::*,
    roles::{errors::into_status_error, models::RoleResponse},
    state::State,
};

/// Update Role Request
///
/// `permissions`, when present, replaces the whole set.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateRoleRequest {
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
}

impl From<UpdateRoleRequest> for RoleUpdate {
    fn from(request: UpdateRoleRequest) -> Self {
        RoleUpdate {
            name: request.name,
            permissions: request
                .permissions
                .map(|permissions| permissions.into_iter().collect()),
        }
    }
}

/// Update Role Handler
#[endpoint(
    tags("roles"),
    summary = "Update Role",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Role updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Role not found"),
        (status_code = StatusCode::CONFLICT, description = "Role name already in use"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    json: JsonBody<UpdateRoleRequest>,
    depot: &mut Depot,
) -> Result<Json<RoleResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(ROLE_WRITE)?;

    let role = state
        .app
        .roles
        .update_role(claims, uuid.into_inner().into(), json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(role.into()))
}
