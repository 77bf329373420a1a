//! Get Sheet Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::SHEETS_READ;

use crate::{
    extensions::*,
    spreadsheets::{errors::into_status_error, models::SheetResponse},
    state::State,
};

/// Get Sheet Handler
#[endpoint(
    tags("spreadsheets"),
    summary = "Get Sheet",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Sheet found"),
        (status_code = StatusCode::NOT_FOUND, description = "Sheet not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    sheet: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<SheetResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_READ)?;

    let sheet = state
        .app
        .spreadsheets
        .get_sheet(claims, uuid.into_inner().into(), sheet.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(sheet.into()))
}
