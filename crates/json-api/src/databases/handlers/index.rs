//! Database Index Handler

use std::sync::Arc;

use salvo::prelude::*;

use nexus_app::auth::permissions::DATABASE_READ;

use crate::{
    databases::{errors::into_status_error, models::DatabasesResponse},
    extensions::*,
    state::State,
};

/// Database Index Handler
#[endpoint(
    tags("databases"),
    summary = "List Databases",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Databases listed"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing database.read"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<DatabasesResponse>, StatusError> {
    let page = ListQuery::from_request(req)?.page_request()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(DATABASE_READ)?;

    let databases = state
        .app
        .databases
        .list_databases(claims, page)
        .await
        .map_err(into_status_error)?;

    Ok(Json(databases.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use nexus_app::{domain::databases::records::DatabaseUuid, pagination::Page};

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    fn make_service(app: TestApp) -> Service {
        app.service(&["database.read"], Router::with_path("databases").get(handler))
    }

    #[tokio::test]
    async fn test_list_databases_success() -> TestResult {
        let mut app = TestApp::default();

        app.databases
            .expect_list_databases()
            .once()
            .withf(|_, page| page.search.as_deref() == Some("ord"))
            .return_once(|_, page| {
                Ok(Page::new(vec![make_database(DatabaseUuid::new())], &page, 1))
            });

        let mut res = TestClient::get("http://example.com/databases?search=ord")
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: DatabasesResponse = res.take_json().await?;

        assert_eq!(body.total, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_bad_sort_order_returns_400() -> TestResult {
        let mut app = TestApp::default();

        app.databases.expect_list_databases().never();

        let res = TestClient::get("http://example.com/databases?sortOrder=sideways")
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
