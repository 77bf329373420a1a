//! Delete Role Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use nexus_app::auth::permissions::ROLE_WRITE;

use crate::{extensions::*, roles::errors::into_status_error, state::State};

/// Delete Role Handler
///
/// Users holding the role lose it.
#[endpoint(
    tags("roles"),
    summary = "Delete Role",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Role deleted"),
        (status_code = StatusCode::NOT_FOUND, description = "Role not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(ROLE_WRITE)?;

    state
        .app
        .roles
        .delete_role(claims, uuid.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;
    use testresult::TestResult;

    use nexus_app::domain::roles::records::RoleUuid;

    use crate::test_helpers::TestApp;

    use super::*;

    #[tokio::test]
    async fn test_delete_role_success() -> TestResult {
        let uuid = RoleUuid::new();

        let mut app = TestApp::default();

        app.roles
            .expect_delete_role()
            .once()
            .withf(move |_, role| *role == uuid)
            .return_once(|_, _| Ok(()));

        let res = TestClient::delete(format!("http://example.com/roles/{uuid}"))
            .send(&app.service(&["role.write"], Router::with_path("roles/{uuid}").delete(handler)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NO_CONTENT));

        Ok(())
    }
}
