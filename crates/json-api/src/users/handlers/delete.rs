//! Delete User Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::USER_WRITE;

use crate::{extensions::*, state::State, users::errors::into_status_error};

/// Delete User Handler
///
/// Soft-deletes the user; their email becomes available again.
#[endpoint(
    tags("users"),
    summary = "Delete User",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "User deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "User not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(USER_WRITE)?;

    state
        .app
        .users
        .delete_user(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::NO_CONTENT)
}
