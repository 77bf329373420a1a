//! Update Sheet Handler

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

use nexus_app::{auth::permissions::SHEETS_WRITE, domain::spreadsheets::data::SheetUpdate};

use crate::{
    extensions::*,
    spreadsheets::{errors::into_status_error, models::SheetResponse},
    state::State,
};

/// Update Sheet Request
///
/// Hidden index lists replace the stored lists. Shrinking the grid drops
/// cells that no longer fit.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateSheetRequest {
    pub name: Option<String>,
    pub row_count: Option<u32>,
    pub column_count: Option<u32>,
    pub frozen_rows: Option<u32>,
    pub frozen_columns: Option<u32>,
    pub hidden_rows: Option<Vec<u32>>,
    pub hidden_columns: Option<Vec<u32>>,
}

impl From<UpdateSheetRequest> for SheetUpdate {
    fn from(request: UpdateSheetRequest) -> Self {
        SheetUpdate {
            name: request.name,
            row_count: request.row_count,
            column_count: request.column_count,
            frozen_rows: request.frozen_rows,
            frozen_columns: request.frozen_columns,
            hidden_rows: request.hidden_rows,
            hidden_columns: request.hidden_columns,
        }
    }
}

/// Update Sheet Handler
#[endpoint(
    tags("spreadsheets"),
    summary = "Update Sheet",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Sheet updated"),
        (status_code = StatusCode::NOT_FOUND, description = "Sheet not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    sheet: PathParam<Uuid>,
    json: JsonBody<UpdateSheetRequest>,
    depot: &mut Depot,
) -> Result<Json<SheetResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_WRITE)?;

    let sheet = state
        .app
        .spreadsheets
        .update_sheet(
            claims,
            uuid.into_inner().into(),
            sheet.into_inner().into(),
            json.into_inner().into(),
        )
        .await
        .map_err(into_status_error)?;

    Ok(Json(sheet.into()))
}
