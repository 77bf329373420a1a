//! User Index Handler

use std::sync::Arc;

use salvo::prelude::*;

use nexus_app::auth::permissions::USER_READ;

use crate::{
    extensions::*,
    state::State,
    users::{errors::into_status_error, models::UsersResponse},
};

/// User Index Handler
///
/// `search` matches email and display name; sortable by `email`,
/// `display_name`, `created_at` and `updated_at`.
#[endpoint(
    tags("users"),
    summary = "List Users",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Users listed"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing user.read"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<UsersResponse>, StatusError> {
    let page = ListQuery::from_request(req)?.page_request()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(USER_READ)?;

    let users = state
        .app
        .users
        .list_users(claims, page)
        .await
        .map_err(into_status_error)?;

    Ok(Json(users.into()))
}
