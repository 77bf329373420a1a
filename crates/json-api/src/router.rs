//! API Router

use salvo::Router;

use crate::{
    api_keys, audit, auth, databases, rate_limit, roles, spreadsheets, subscriptions, tenants,
    users,
};

/// Routes mounted under `/api/v1`.
///
/// Registration and login are open; everything else requires a bearer token
/// or API key and counts against the caller's rate limit.
pub(crate) fn api_router() -> Router {
    Router::with_path("api/v1")
        .push(
            Router::with_path("auth")
                .push(Router::with_path("register").post(auth::register::handler))
                .push(Router::with_path("login").post(auth::login::handler)),
        )
        .push(
            Router::new()
                .hoop(auth::middleware::handler)
                .hoop(rate_limit::handler)
                .push(tenants_router())
                .push(users_router())
                .push(roles_router())
                .push(api_keys_router())
                .push(databases_router())
                .push(subscriptions_router())
                .push(Router::with_path("audit-logs").get(audit::index::handler))
                .push(spreadsheets_router()),
        )
}

fn tenants_router() -> Router {
    Router::with_path("tenants")
        .get(tenants::index::handler)
        .post(tenants::create::handler)
        .push(
            Router::with_path("{uuid}")
                .get(tenants::get::handler)
                .put(tenants::update::handler)
                .patch(tenants::update::handler)
                .delete(tenants::delete::handler),
        )
}

fn users_router() -> Router {
    Router::with_path("users")
        .get(users::index::handler)
        .post(users::create::handler)
        .push(
            Router::with_path("{uuid}")
                .get(users::get::handler)
                .put(users::update::handler)
                .patch(users::update::handler)
                .delete(users::delete::handler),
        )
}

fn roles_router() -> Router {
    Router::with_path("roles")
        .get(roles::index::handler)
        .post(roles::create::handler)
        .push(
            Router::with_path("{uuid}")
                .get(roles::get::handler)
                .put(roles::update::handler)
                .patch(roles::update::handler)
                .delete(roles::delete::handler),
        )
}

fn api_keys_router() -> Router {
    Router::with_path("api-keys")
        .get(api_keys::index::handler)
        .post(api_keys::create::handler)
        .push(
            Router::with_path("{uuid}")
                .get(api_keys::get::handler)
                .delete(api_keys::revoke::handler)
                .push(Router::with_path("revoke").post(api_keys::revoke::handler)),
        )
}

fn databases_router() -> Router {
    Router::with_path("databases")
        .get(databases::index::handler)
        .post(databases::create::handler)
        .push(
            Router::with_path("{uuid}")
                .get(databases::get::handler)
                .delete(databases::delete::handler)
                .push(Router::with_path("scale").post(databases::scale::handler))
                .push(Router::with_path("status").put(databases::status::handler)),
        )
}

fn subscriptions_router() -> Router {
    Router::with_path("subscriptions")
        .get(subscriptions::index::handler)
        .post(subscriptions::create::handler)
        .push(
            Router::with_path("{uuid}")
                .get(subscriptions::get::handler)
                .put(subscriptions::update::handler)
                .patch(subscriptions::update::handler)
                .push(Router::with_path("cancel").post(subscriptions::cancel::handler)),
        )
}

fn spreadsheets_router() -> Router {
    Router::with_path("spreadsheets")
        .get(spreadsheets::index::handler)
        .post(spreadsheets::create::handler)
        .push(
            Router::with_path("{uuid}")
                .get(spreadsheets::get::handler)
                .put(spreadsheets::update::handler)
                .patch(spreadsheets::update::handler)
                .delete(spreadsheets::delete::handler)
                .push(
                    Router::with_path("sheets")
                        .post(spreadsheets::sheets::create::handler)
                        .push(
                            Router::with_path("{sheet}")
                                .get(spreadsheets::sheets::get::handler)
                                .put(spreadsheets::sheets::update::handler)
                                .patch(spreadsheets::sheets::update::handler)
                                .delete(spreadsheets::sheets::delete::handler)
                                .push(cells_router()),
                        ),
                ),
        )
}

fn cells_router() -> Router {
    Router::with_path("cells")
        .get(spreadsheets::cells::index::handler)
        .push(Router::with_path("batch").post(spreadsheets::cells::batch::handler))
        .push(Router::with_path("{row}/{col}").put(spreadsheets::cells::update::handler))
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        prelude::*,
        test::{ResponseExt, TestClient},
    };
    use serde_json::json;
    use testresult::TestResult;

    use nexus_app::domain::users::UsersServiceError;

    use crate::test_helpers::TestApp;

    use super::*;

    fn make_service(app: TestApp) -> Service {
        Service::new(Router::new().hoop(inject(app.state())).push(api_router()))
    }

    #[tokio::test]
    async fn test_protected_routes_require_credentials() -> TestResult {
        let mut res = TestClient::get("http://example.com/api/v1/spreadsheets")
            .send(&make_service(TestApp::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert!(res.take_string().await?.contains("Authorization"));

        Ok(())
    }

    #[tokio::test]
    async fn test_login_skips_the_auth_middleware() -> TestResult {
        let mut app = TestApp::default();

        app.users
            .expect_authenticate()
            .once()
            .return_once(|_| Err(UsersServiceError::InvalidCredentials));

        let mut res = TestClient::post("http://example.com/api/v1/auth/login")
            .json(&json!({ "email": "alice@t.example", "password": "wrong" }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert!(!res.take_string().await?.contains("Authorization header"));

        Ok(())
    }
}
