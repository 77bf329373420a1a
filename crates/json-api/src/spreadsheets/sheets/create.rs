//! Create Sheet Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};
use uuid::Uuid;

use nexus_app::auth::permissions::SHEETS_WRITE;

use crate::{
    extensions::*,
    spreadsheets::{
        errors::into_status_error, handlers::create::NewSheetRequest, models::SheetResponse,
    },
    state::State,
};

/// Create Sheet Handler
///
/// The sheet is appended after the last one.
#[endpoint(
    tags("spreadsheets"),
    summary = "Create Sheet",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Sheet created"),
        (status_code = StatusCode::NOT_FOUND, description = "Spreadsheet not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    json: JsonBody<NewSheetRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<SheetResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_WRITE)?;

    let sheet = state
        .app
        .spreadsheets
        .create_sheet(claims, uuid.into_inner().into(), json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    res.add_header(
        LOCATION,
        format!(
            "/api/v1/spreadsheets/{}/sheets/{}",
            sheet.spreadsheet, sheet.uuid
        ),
        true,
    )
    .or_500("failed to set location header")?
    .status_code(StatusCode::CREATED);

    Ok(Json(sheet.into()))
}
