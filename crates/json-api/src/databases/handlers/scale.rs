//! Scale Database Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{auth::permissions::DATABASE_WRITE, domain::databases::records::SizeClass};

use crate::{
    databases::{errors::into_status_error, models::DatabaseResponse},
    extensions::*,
    state::State,
};

/// Scale Database Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ScaleDatabaseRequest {
    #[serde(alias = "sizeClass")]
    pub size_class: String,
}

/// Scale Database Handler
///
/// Only a `ready` instance can be scaled.
#[endpoint(
    tags("databases"),
    summary = "Scale Database",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Scaling started"),
        (status_code = StatusCode::NOT_FOUND, description = "Database not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Database is not ready"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    json: JsonBody<ScaleDatabaseRequest>,
    depot: &mut Depot,
) -> Result<Json<DatabaseResponse>, StatusError> {
    let size_class = json
        .into_inner()
        .size_class
        .parse::<SizeClass>()
        .or_400("Invalid size class")?;

    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(DATABASE_WRITE)?;

    let database = state
        .app
        .databases
        .scale_database(claims, uuid.into_inner().into(), size_class)
        .await
        .map_err(into_status_error)?;

    Ok(Json(database.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use nexus_app::domain::databases::{
        DatabasesServiceError,
        records::{DatabaseRecord, DatabaseStatus, DatabaseUuid},
    };

    use crate::test_helpers::TestApp;

    use super::{super::tests::*, *};

    fn make_service(app: TestApp) -> Service {
        app.service(
            &["database.write"],
            Router::with_path("databases/{uuid}/scale").post(handler),
        )
    }

    #[tokio::test]
    async fn test_scale_ready_database() -> TestResult {
        let uuid = DatabaseUuid::new();

        let mut app = TestApp::default();

        app.databases
            .expect_scale_database()
            .once()
            .withf(move |_, database, size| *database == uuid && *size == SizeClass::Large)
            .return_once(move |_, _, _| {
                Ok(DatabaseRecord {
                    status: DatabaseStatus::Scaling,
                    size_class: SizeClass::Large,
                    ..make_database(uuid)
                })
            });

        let mut res = TestClient::post(format!("http://example.com/databases/{uuid}/scale"))
            .json(&json!({ "sizeClass": "large" }))
            .send(&make_service(app))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: DatabaseResponse = res.take_json().await?;

        assert_eq!(body.status, "scaling");
        assert_eq!(body.size_class, "large");

        Ok(())
    }

    #[tokio::test]
    async fn test_scale_while_provisioning_returns_422() -> TestResult {
        let mut app = TestApp::default();

        app.databases.expect_scale_database().once().return_once(|_, _, _| {
            Err(DatabasesServiceError::InvalidTransition {
                from: DatabaseStatus::Provisioning,
                to: DatabaseStatus::Scaling,
            })
        });

        let mut res = TestClient::post(format!(
            "http://example.com/databases/{}/scale",
            DatabaseUuid::new()
        ))
        .json(&json!({ "size_class": "medium" }))
        .send(&make_service(app))
        .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert!(res.take_string().await?.contains("Invalid status transition"));

        Ok(())
    }
}
