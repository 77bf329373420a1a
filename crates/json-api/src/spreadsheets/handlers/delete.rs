//! Delete Spreadsheet Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::SHEETS_WRITE;

use crate::{extensions::*, spreadsheets::errors::into_status_error, state::State};

/// Delete Spreadsheet Handler
///
/// Soft delete; its sheets and cells stop being readable.
#[endpoint(
    tags("spreadsheets"),
    summary = "Delete Spreadsheet",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Spreadsheet deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "Spreadsheet not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_WRITE)?;

    state
        .app
        .spreadsheets
        .delete_spreadsheet(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::NO_CONTENT)
}
