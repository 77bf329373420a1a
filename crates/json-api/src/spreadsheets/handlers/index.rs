//! Spreadsheet Index Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use nexus_app::{auth::permissions::SHEETS_READ, domain::spreadsheets::data::SpreadsheetFilter};

use crate::{
    extensions::*,
    spreadsheets::{errors::into_status_error, models::SpreadsheetsResponse},
    state::State,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderQuery {
    folder_id: Option<Uuid>,
}

/// Spreadsheet Index Handler
///
/// `search` matches the title; sortable by `title`, `created_at` and
/// `updated_at`. `folderId` narrows to one folder.
#[endpoint(
    tags("spreadsheets"),
    summary = "List Spreadsheets",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Spreadsheets listed"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing sheets.read"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<SpreadsheetsResponse>, StatusError> {
    let page = ListQuery::from_request(req)?.page_request()?;
    let folder = req
        .parse_queries::<FolderQuery>()
        .or_400("Invalid folderId")?
        .folder_id;

    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_READ)?;

    let spreadsheets = state
        .app
        .spreadsheets
        .list_spreadsheets(claims, SpreadsheetFilter { folder }, page)
        .await
        .map_err(into_status_error)?;

    Ok(Json(spreadsheets.into()))
}
