//! Get Database Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::DATABASE_READ;

use crate::{
    databases::{errors::into_status_error, models::DatabaseResponse},
    extensions::*,
    state::State,
};

/// Get Database Handler
#[endpoint(
    tags("databases"),
    summary = "Get Database",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Database found"),
        (status_code = StatusCode::NOT_FOUND, description = "Database not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<DatabaseResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(DATABASE_READ)?;

    let database = state
        .app
        .databases
        .get_database(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(database.into()))
}
