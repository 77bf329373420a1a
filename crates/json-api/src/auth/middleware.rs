//! Auth middleware.

use std::sync::Arc;

use salvo::{http::header::AUTHORIZATION, prelude::*};

use nexus_app::auth::Claims;

use crate::{
    auth::errors::{api_key_error, token_error},
    extensions::*,
    state::State,
};

/// Credential presented in the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credential<'a> {
    Bearer(&'a str),
    ApiKey(&'a str),
}

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let claims = match authenticate(req, depot).await {
        Ok(claims) => claims,
        Err(error) => {
            res.render(error);
            ctrl.skip_rest();

            return;
        }
    };

    depot.insert_claims(claims);

    ctrl.call_next(req, depot, res).await;
}

async fn authenticate(req: &Request, depot: &Depot) -> Result<Claims, StatusError> {
    let Some(credential) = extract_credential(req) else {
        return Err(StatusError::unauthorized().brief("Missing or invalid Authorization header"));
    };

    let state = depot.obtain_or_500::<Arc<State>>()?;

    match credential {
        Credential::Bearer(token) => state.app.tokens.verify(token).map_err(|e| token_error(&e)),
        Credential::ApiKey(key) => state
            .app
            .api_keys
            .authenticate(key)
            .await
            .map_err(api_key_error),
    }
}

fn extract_credential(req: &Request) -> Option<Credential<'_>> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if token.is_empty() {
        return None;
    }

    if scheme.eq_ignore_ascii_case("bearer") {
        Some(Credential::Bearer(token))
    } else if scheme.eq_ignore_ascii_case("apikey") {
        Some(Credential::ApiKey(token))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, Timestamp};
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use nexus_app::{
        auth::{Permissions, TokenManager},
        domain::api_keys::ApiKeysServiceError,
    };

    use crate::test_helpers::{TEST_SECRET, TEST_TENANT_UUID, TEST_USER_UUID, TestApp, test_claims, test_tokens};

    use super::*;

    #[salvo::handler]
    async fn echo_claims(depot: &mut Depot, res: &mut Response) {
        let subject = depot.claims_or_401().ok().map_or_else(
            || "missing".to_string(),
            |claims| format!("{}/{}", claims.tenant, claims.subject),
        );

        res.render(subject);
    }

    fn make_service(app: TestApp) -> Service {
        Service::new(
            Router::new()
                .hoop(salvo::affix_state::inject(app.state()))
                .hoop(handler)
                .push(Router::new().get(echo_claims)),
        )
    }

    fn bearer_token(permissions: &[&str]) -> TestResult<String> {
        let permissions: Permissions = permissions.iter().copied().collect();

        Ok(test_tokens()
            .issue(TEST_USER_UUID, TEST_TENANT_UUID, "admin@nexus.test", &permissions)?
            .token)
    }

    #[test]
    fn credentials_are_parsed_by_scheme() {
        let mut req = Request::new();

        req.headers_mut()
            .insert(AUTHORIZATION, "ApiKey nxabc.def".parse().expect("valid header"));

        assert_eq!(extract_credential(&req), Some(Credential::ApiKey("nxabc.def")));

        req.headers_mut()
            .insert(AUTHORIZATION, "bearer  tok ".parse().expect("valid header"));

        assert_eq!(extract_credential(&req), Some(Credential::Bearer("tok")));

        req.headers_mut()
            .insert(AUTHORIZATION, "Bearer".parse().expect("valid header"));

        assert_eq!(extract_credential(&req), None);
    }

    #[tokio::test]
    async fn test_missing_authorization_header_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .send(&make_service(TestApp::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_scheme_returns_401() -> TestResult {
        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "Basic abc123", true)
            .send(&make_service(TestApp::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_valid_bearer_token_injects_claims() -> TestResult {
        let token = bearer_token(&["user.read"])?;

        let mut res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, format!("Bearer {token}"), true)
            .send(&make_service(TestApp::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(
            res.take_string().await?,
            format!("{TEST_TENANT_UUID}/{TEST_USER_UUID}")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_returns_401() -> TestResult {
        let other = TokenManager::new(b"another-secret", SignedDuration::from_hours(1))?;
        let token = other
            .issue(TEST_USER_UUID, TEST_TENANT_UUID, "admin@nexus.test", &Permissions::new())?
            .token;

        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, format!("Bearer {token}"), true)
            .send(&make_service(TestApp::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_expired_token_returns_401() -> TestResult {
        let tokens = TokenManager::new(TEST_SECRET, SignedDuration::from_mins(5))?;
        let issued_at = Timestamp::now().checked_sub(SignedDuration::from_hours(1))?;
        let token = tokens
            .issue_at(
                TEST_USER_UUID,
                TEST_TENANT_UUID,
                "admin@nexus.test",
                &Permissions::new(),
                issued_at,
            )?
            .token;

        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, format!("Bearer {token}"), true)
            .send(&make_service(TestApp::default()))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }

    #[tokio::test]
    async fn test_valid_api_key_injects_key_claims() -> TestResult {
        let mut app = TestApp::default();

        app.api_keys
            .expect_authenticate()
            .once()
            .withf(|key| key == "nxabcdefgh.0123")
            .return_once(|_| Ok(test_claims(&["sheets.read"])));

        let mut res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "ApiKey nxabcdefgh.0123", true)
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(
            res.take_string().await?,
            format!("{TEST_TENANT_UUID}/{TEST_USER_UUID}")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_api_key_returns_401() -> TestResult {
        let mut app = TestApp::default();

        app.api_keys
            .expect_authenticate()
            .once()
            .return_once(|_| Err(ApiKeysServiceError::InvalidKey));

        let res = TestClient::get("http://example.com")
            .add_header(AUTHORIZATION, "ApiKey nxabcdefgh.0123", true)
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
