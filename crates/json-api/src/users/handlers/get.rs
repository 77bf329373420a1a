//! Get User Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::USER_READ;

use crate::{
    extensions::*,
    state::State,
    users::{errors::into_status_error, models::UserResponse},
};

/// Get User Handler
#[endpoint(
    tags("users"),
    summary = "Get User",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "User found"),
        (status_code = StatusCode::NOT_FOUND, description = "User not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<UserResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(USER_READ)?;

    let user = state
        .app
        .users
        .get_user(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use nexus_app::domain::users::{UsersServiceError, records::UserUuid};

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    fn make_service(app: TestApp) -> Service {
        app.service(&["user.read"], Router::with_path("users/{uuid}").get(handler))
    }

    #[tokio::test]
    async fn test_get_user_success() -> TestResult {
        let uuid = UserUuid::new();

        let mut app = TestApp::default();

        app.users
            .expect_get_user()
            .once()
            .withf(move |_, user| *user == uuid)
            .return_once(move |_, _| Ok(make_user(uuid)));

        let mut res = TestClient::get(format!("http://example.com/users/{uuid}"))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: UserResponse = res.take_json().await?;

        assert_eq!(body.email, "bob@t.example");
        assert_eq!(body.status, "active");

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_user_returns_404() -> TestResult {
        let mut app = TestApp::default();

        app.users
            .expect_get_user()
            .once()
            .return_once(|_, _| Err(UsersServiceError::NotFound));

        let res = TestClient::get(format!("http://example.com/users/{}", UserUuid::new()))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
