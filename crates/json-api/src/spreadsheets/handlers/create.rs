//! Create Spreadsheet Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{
    auth::permissions::SHEETS_WRITE,
    domain::spreadsheets::data::{NewSheet, NewSpreadsheet},
};

use crate::{
    extensions::*,
    spreadsheets::{errors::into_status_error, models::SpreadsheetResponse},
    state::State,
};

/// Initial sheet
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewSheetRequest {
    pub name: String,

    /// Defaults to 1000
    pub row_count: Option<u32>,

    /// Defaults to 26
    pub column_count: Option<u32>,
}

impl From<NewSheetRequest> for NewSheet {
    fn from(request: NewSheetRequest) -> Self {
        NewSheet {
            name: request.name,
            row_count: request.row_count,
            column_count: request.column_count,
        }
    }
}

/// Create Spreadsheet Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateSpreadsheetRequest {
    pub title: String,
    pub folder_id: Option<Uuid>,

    /// A single `Sheet1` is created when empty.
    #[serde(default)]
    pub sheets: Vec<NewSheetRequest>,
}

impl From<CreateSpreadsheetRequest> for NewSpreadsheet {
    fn from(request: CreateSpreadsheetRequest) -> Self {
        NewSpreadsheet {
            title: request.title,
            folder: request.folder_id,
            sheets: request.sheets.into_iter().map(Into::into).collect(),
        }
    }
}

/// Create Spreadsheet Handler
#[endpoint(
    tags("spreadsheets"),
    summary = "Create Spreadsheet",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Spreadsheet created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing sheets.write"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateSpreadsheetRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<SpreadsheetResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_WRITE)?;

    let detail = state
        .app
        .spreadsheets
        .create_spreadsheet(claims, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    res.add_header(
        LOCATION,
        format!("/api/v1/spreadsheets/{}", detail.spreadsheet.uuid),
        true,
    )
    .or_500("failed to set location header")?
    .status_code(StatusCode::CREATED);

    Ok(Json(detail.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use nexus_app::domain::spreadsheets::{
        SpreadsheetsServiceError,
        records::{SheetUuid, SpreadsheetDetail, SpreadsheetUuid},
    };

    use crate::{
        spreadsheets::tests::{make_sheet, make_spreadsheet},
        test_helpers::TestApp,
    };

    use super::*;

    fn make_service(app: TestApp) -> Service {
        app.service(&["sheets.write"], Router::with_path("spreadsheets").post(handler))
    }

    #[tokio::test]
    async fn test_create_with_default_sheet() -> TestResult {
        let uuid = SpreadsheetUuid::new();

        let mut app = TestApp::default();

        app.spreadsheets
            .expect_create_spreadsheet()
            .once()
            .withf(|_, new| new.title == "Budget" && new.sheets.is_empty() && new.folder.is_none())
            .return_once(move |_, _| {
                Ok(SpreadsheetDetail {
                    spreadsheet: make_spreadsheet(uuid),
                    sheets: vec![make_sheet(uuid, SheetUuid::new())],
                })
            });

        let mut res = TestClient::post("http://example.com/spreadsheets")
            .json(&json!({ "title": "Budget" }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        let body: SpreadsheetResponse = res.take_json().await?;

        assert_eq!(body.id, uuid.into_uuid());
        assert_eq!(body.sheets.map(|sheets| sheets.len()), Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn test_initial_sheets_keep_their_order() -> TestResult {
        let uuid = SpreadsheetUuid::new();

        let mut app = TestApp::default();

        app.spreadsheets
            .expect_create_spreadsheet()
            .once()
            .withf(|_, new| {
                new.sheets
                    .iter()
                    .map(|sheet| sheet.name.as_str())
                    .eq(["Q1", "Q2"])
                    && new.sheets.first().and_then(|sheet| sheet.row_count) == Some(50)
            })
            .return_once(move |_, _| {
                Ok(SpreadsheetDetail {
                    spreadsheet: make_spreadsheet(uuid),
                    sheets: Vec::new(),
                })
            });

        let res = TestClient::post("http://example.com/spreadsheets")
            .json(&json!({
                "title": "Budget",
                "sheets": [{ "name": "Q1", "rowCount": 50 }, { "name": "Q2" }],
            }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));

        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_sheet_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.spreadsheets.expect_create_spreadsheet().once().return_once(|_, _| {
            Err(SpreadsheetsServiceError::InvalidSheet(
                "row count must be between 1 and 1048576".to_string(),
            ))
        });

        let res = TestClient::post("http://example.com/spreadsheets")
            .json(&json!({ "title": "Huge", "sheets": [{ "name": "A", "rowCount": 9_999_999 }] }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
