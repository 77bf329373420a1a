//! Update Cell Handler

use std::sync::Arc;

use salvo::{
    oapi::extract::{JsonBody, PathParam},
    prelude::*,
};
use uuid::Uuid;

use nexus_app::auth::permissions::SHEETS_WRITE;

use crate::{
    extensions::*,
    spreadsheets::{
        errors::into_status_error,
        models::{CellContentsRequest, CellResponse},
    },
    state::State,
};

/// Update Cell Handler
///
/// Responds with the stored cell, or `204 No Content` when the write left
/// the coordinate empty.
#[endpoint(
    tags("spreadsheets"),
    summary = "Update Cell",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cell stored", body = CellResponse),
        (status_code = StatusCode::NO_CONTENT, description = "Cell cleared"),
        (status_code = StatusCode::NOT_FOUND, description = "Sheet not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Coordinate outside the sheet"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    sheet: PathParam<Uuid>,
    row: PathParam<u32>,
    col: PathParam<u32>,
    json: JsonBody<CellContentsRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<(), StatusError> {
    let update = json
        .into_inner()
        .at(row.into_inner(), col.into_inner());

    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_WRITE)?;

    let cell = state
        .app
        .spreadsheets
        .update_cell(
            claims,
            uuid.into_inner().into(),
            sheet.into_inner().into(),
            update,
        )
        .await
        .map_err(into_status_error)?;

    match cell {
        Some(cell) => res.render(Json(CellResponse::from(cell))),
        None => {
            res.status_code(StatusCode::NO_CONTENT);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use nexus_app::domain::spreadsheets::{
        SpreadsheetsServiceError,
        batch::OutOfRangeCell,
        data::Patch,
        records::{CellRecord, SheetUuid, SpreadsheetUuid},
        values::CellValue,
    };

    use crate::test_helpers::TestApp;

    use super::*;

    fn make_service(app: TestApp) -> Service {
        app.service(
            &["sheets.write"],
            Router::with_path("spreadsheets/{uuid}/sheets/{sheet}/cells/{row}/{col}").put(handler),
        )
    }

    #[tokio::test]
    async fn test_formula_is_stored() -> TestResult {
        let spreadsheet = SpreadsheetUuid::new();
        let sheet = SheetUuid::new();

        let mut app = TestApp::default();

        app.spreadsheets
            .expect_update_cell()
            .once()
            .withf(move |_, parent, uuid, update| {
                *parent == spreadsheet
                    && *uuid == sheet
                    && update.row == 3
                    && update.col == 1
                    && update.formula == Patch::Set("=SUM(A1:A3)".to_string())
                    && update.value.is_missing()
            })
            .return_once(move |_, _, _, _| {
                Ok(Some(CellRecord {
                    sheet,
                    row: 3,
                    col: 1,
                    value: CellValue::empty(),
                    formula: Some("=SUM(A1:A3)".to_string()),
                    formatted_value: None,
                    style: None,
                    updated_at: Timestamp::UNIX_EPOCH,
                }))
            });

        let mut res = TestClient::put(format!(
            "http://example.com/spreadsheets/{spreadsheet}/sheets/{sheet}/cells/3/1"
        ))
        .json(&json!({ "formula": "=SUM(A1:A3)" }))
        .send(&make_service(app))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: CellResponse = res.take_json().await?;

        assert_eq!(body.formula.as_deref(), Some("=SUM(A1:A3)"));
        assert_eq!(body.data_type, "string");

        Ok(())
    }

    #[tokio::test]
    async fn test_null_value_clears_cell() -> TestResult {
        let mut app = TestApp::default();

        app.spreadsheets
            .expect_update_cell()
            .once()
            .withf(|_, _, _, update| update.value == Patch::Clear)
            .return_once(|_, _, _, _| Ok(None));

        let res = TestClient::put(format!(
            "http://example.com/spreadsheets/{}/sheets/{}/cells/0/0",
            SpreadsheetUuid::new(),
            SheetUuid::new()
        ))
        .json(&json!({ "value": null }))
        .send(&make_service(app))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::NO_CONTENT));

        Ok(())
    }

    #[tokio::test]
    async fn test_outside_grid_returns_422() -> TestResult {
        let mut app = TestApp::default();

        app.spreadsheets
            .expect_update_cell()
            .once()
            .return_once(|_, _, _, _| {
                Err(SpreadsheetsServiceError::OutOfRange {
                    cells: vec![OutOfRangeCell {
                        index: 0,
                        row: 50,
                        col: 0,
                    }],
                })
            });

        let res = TestClient::put(format!(
            "http://example.com/spreadsheets/{}/sheets/{}/cells/50/0",
            SpreadsheetUuid::new(),
            SheetUuid::new()
        ))
        .json(&json!({ "value": "late" }))
        .send(&make_service(app))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }
}
