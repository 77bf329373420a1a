//! Update Spreadsheet Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::Deserialize;
use uuid::Uuid;

use nexus_app::{
    auth::permissions::SHEETS_WRITE,
    domain::spreadsheets::data::{Patch, SpreadsheetUpdate},
};

use crate::{
    extensions::*,
    spreadsheets::{
        errors::into_status_error,
        models::{SpreadsheetResponse, patch},
    },
    state::State,
};

/// Update Spreadsheet Request
///
/// `folderId: null` moves the spreadsheet out of its folder.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateSpreadsheetRequest {
    pub title: Option<String>,

    #[serde(default, deserialize_with = "patch")]
    #[salvo(schema(value_type = Option<Uuid>))]
    pub folder_id: Patch<Uuid>,
}

impl From<UpdateSpreadsheetRequest> for SpreadsheetUpdate {
    fn from(request: UpdateSpreadsheetRequest) -> Self {
        SpreadsheetUpdate {
            title: request.title,
            folder: request.folder_id,
        }
    }
}

/// Update Spreadsheet Handler
#[endpoint(
    tags("spreadsheets"),
    summary = "Update Spreadsheet",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Spreadsheet updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Spreadsheet not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    json: JsonBody<UpdateSpreadsheetRequest>,
    depot: &mut Depot,
) -> Result<Json<SpreadsheetResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_WRITE)?;

    let spreadsheet = state
        .app
        .spreadsheets
        .update_spreadsheet(claims, uuid.into_inner().into(), json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(spreadsheet.into()))
}
