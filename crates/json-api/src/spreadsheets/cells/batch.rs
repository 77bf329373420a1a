//! Batch Update Cells Handler

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

use nexus_app::auth::permissions::SHEETS_WRITE;

use crate::{
    extensions::*,
    spreadsheets::{
        errors::into_status_error,
        models::{BatchResponse, CellUpdateRequest},
    },
    state::State,
};

/// Batch Update Request
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct BatchUpdateRequest {
    pub updates: Vec<CellUpdateRequest>,
}

/// Batch Update Cells Handler
///
/// All entries are applied in one transaction, or none are.
#[endpoint(
    tags("spreadsheets"),
    summary = "Batch Update Cells",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Batch applied"),
        (status_code = StatusCode::NOT_FOUND, description = "Sheet not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Entries outside the sheet"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    sheet: PathParam<Uuid>,
    json: JsonBody<BatchUpdateRequest>,
    depot: &mut Depot,
) -> Result<Json<BatchResponse>, StatusError> {
    let updates = json
        .into_inner()
        .updates
        .into_iter()
        .map(Into::into)
        .collect();

    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_WRITE)?;

    let outcome = state
        .app
        .spreadsheets
        .batch_update_cells(
            claims,
            uuid.into_inner().into(),
            sheet.into_inner().into(),
            updates,
        )
        .await
        .map_err(into_status_error)?;

    Ok(Json(outcome.into()))
}
