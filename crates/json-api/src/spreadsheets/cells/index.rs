//! Cell Range Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use serde::Deserialize;
use uuid::Uuid;

use nexus_app::{auth::permissions::SHEETS_READ, domain::spreadsheets::data::CellRange};

use crate::{
    extensions::*,
    spreadsheets::{errors::into_status_error, models::CellsResponse},
    state::State,
};

/// Closed range, every bound required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeQuery {
    start_row: u32,
    end_row: u32,
    start_col: u32,
    end_col: u32,
}

impl RangeQuery {
    fn from_request(req: &mut Request) -> Result<Self, StatusError> {
        req.parse_queries::<Self>().or_400("Invalid cell range")
    }
}

impl From<RangeQuery> for CellRange {
    fn from(query: RangeQuery) -> Self {
        CellRange {
            start_row: query.start_row,
            end_row: query.end_row,
            start_col: query.start_col,
            end_col: query.end_col,
        }
    }
}

/// Cell Range Handler
///
/// Only stored cells are returned; empty coordinates are omitted.
#[endpoint(
    tags("spreadsheets"),
    summary = "Get Cells",
    security(("bearer_auth" = []), ("api_key" = [])),
    parameters(
        ("startRow" = u32, Query, description = "First row, inclusive"),
        ("endRow" = u32, Query, description = "Last row, inclusive"),
        ("startCol" = u32, Query, description = "First column, inclusive"),
        ("endCol" = u32, Query, description = "Last column, inclusive"),
    ),
    responses(
        (status_code = StatusCode::OK, description = "Cells in range"),
        (status_code = StatusCode::NOT_FOUND, description = "Sheet not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing sheets.read"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    sheet: PathParam<Uuid>,
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<CellsResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_READ)?;
    let range = RangeQuery::from_request(req)?;

    let cells = state
        .app
        .spreadsheets
        .get_cells(
            claims,
            uuid.into_inner().into(),
            sheet.into_inner().into(),
            range.into(),
        )
        .await
        .map_err(into_status_error)?;

    Ok(Json(cells.into()))
}
