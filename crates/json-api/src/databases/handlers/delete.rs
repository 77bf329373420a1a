//! Delete Database Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::DATABASE_WRITE;

use crate::{databases::errors::into_status_error, extensions::*, state::State};

/// Delete Database Handler
#[endpoint(
    tags("databases"),
    summary = "Delete Database",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Database deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "Database not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(DATABASE_WRITE)?;

    state
        .app
        .databases
        .delete_database(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;
    use testresult::TestResult;

    use nexus_app::domain::databases::{DatabasesServiceError, records::DatabaseUuid};

    use crate::test_helpers::TestApp;

    use super::*;

    fn make_service(app: TestApp) -> Service {
        app.service(
            &["database.write"],
            Router::with_path("databases/{uuid}").delete(handler),
        )
    }

    #[tokio::test]
    async fn test_delete_database_success() -> TestResult {
        let uuid = DatabaseUuid::new();

        let mut app = TestApp::default();

        app.databases
            .expect_delete_database()
            .once()
            .withf(move |_, database| *database == uuid)
            .return_once(|_, _| Ok(()));

        let res = TestClient::delete(format!("http://example.com/databases/{uuid}"))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NO_CONTENT));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_twice_returns_404() -> TestResult {
        let mut app = TestApp::default();

        app.databases
            .expect_delete_database()
            .once()
            .return_once(|_, _| Err(DatabasesServiceError::NotFound));

        let res = TestClient::delete(format!("http://example.com/databases/{}", DatabaseUuid::new()))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
