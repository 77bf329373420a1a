//! Delete Sheet Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::SHEETS_WRITE;

use crate::{extensions::*, spreadsheets::errors::into_status_error, state::State};

/// Delete Sheet Handler
///
/// Removes the sheet and its cells; later sheets move up one position.
#[endpoint(
    tags("spreadsheets"),
    summary = "Delete Sheet",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Sheet deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "Sheet not found"),
        (status_code = StatusCode::CONFLICT, description = "Last sheet of the spreadsheet"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    sheet: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(SHEETS_WRITE)?;

    state
        .app
        .spreadsheets
        .delete_sheet(claims, uuid.into_inner().into(), sheet.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;
    use testresult::TestResult;

    use nexus_app::domain::spreadsheets::{
        SpreadsheetsServiceError,
        records::{SheetUuid, SpreadsheetUuid},
    };

    use crate::test_helpers::TestApp;

    use super::*;

    fn make_service(app: TestApp) -> Service {
        app.service(
            &["sheets.write"],
            Router::with_path("spreadsheets/{uuid}/sheets/{sheet}").delete(handler),
        )
    }

    #[tokio::test]
    async fn test_delete_sheet_success() -> TestResult {
        let spreadsheet = SpreadsheetUuid::new();
        let uuid = SheetUuid::new();

        let mut app = TestApp::default();

        app.spreadsheets
            .expect_delete_sheet()
            .once()
            .withf(move |_, parent, sheet| *parent == spreadsheet && *sheet == uuid)
            .return_once(|_, _, _| Ok(()));

        let res = TestClient::delete(format!(
            "http://example.com/spreadsheets/{spreadsheet}/sheets/{uuid}"
        ))
        .send(&make_service(app))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::NO_CONTENT));

        Ok(())
    }

    #[tokio::test]
    async fn test_last_sheet_returns_409() -> TestResult {
        let mut app = TestApp::default();

        app.spreadsheets
            .expect_delete_sheet()
            .once()
            .return_once(|_, _, _| Err(SpreadsheetsServiceError::LastSheet));

        let res = TestClient::delete(format!(
            "http://example.com/spreadsheets/{}/sheets/{}",
            SpreadsheetUuid::new(),
            SheetUuid::new()
        ))
        .send(&make_service(app))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
