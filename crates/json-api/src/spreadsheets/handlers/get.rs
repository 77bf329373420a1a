//! Get Spreadsheet Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::SHEETS_READ;

use crate::{
    extensions::*,
    spreadsheets::{errors::into_status_error, models::SpreadsheetResponse},
    state::State,
};

/// Get Spreadsheet Handler
///
/// Includes the sheets in position order.
#[endpoint(
    tags("spreadsheets"),
    summary = "Get Spreadsheet",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Spreadsheet found"),
        (status_code = StatusCode::NOT_FOUND, description = "Spreadsheet not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<SpreadsheetResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_READ)?;

    let detail = state
        .app
        .spreadsheets
        .get_spreadsheet(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(detail.into()))
}
