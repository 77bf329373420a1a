//! Database Status Report Handler

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

use nexus_app::{
    auth::permissions::DATABASE_WRITE,
    domain::databases::{
        data::{ConnectionInfo, StatusUpdate},
        records::DatabaseStatus,
    },
};

use crate::{
    databases::{
        errors::into_status_error,
        models::{ConnectionResponse, DatabaseResponse},
    },
    extensions::*,
    state::State,
};

/// Database Status Report
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct DatabaseStatusRequest {
    pub status: String,

    /// Only kept when `status` is `ready`.
    #[serde(default)]
    pub connection: Option<ConnectionResponse>,
}

impl DatabaseStatusRequest {
    fn into_update(self) -> Result<StatusUpdate, StatusError> {
        Ok(StatusUpdate {
            status: self
                .status
                .parse::<DatabaseStatus>()
                .or_400("Invalid database status")?,
            connection: self.connection.map(|connection| ConnectionInfo {
                host: connection.host,
                port: connection.port,
                database: connection.database,
            }),
        })
    }
}

/// Database Status Report Handler
///
/// Called by the provisioner as an instance moves through its lifecycle.
#[endpoint(
    tags("databases"),
    summary = "Report Database Status",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Status applied"),
        (status_code = StatusCode::NOT_FOUND, description = "Database not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid status transition"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    json: JsonBody<DatabaseStatusRequest>,
    depot: &mut Depot,
) -> Result<Json<DatabaseResponse>, StatusError> {
    let update = json.into_inner().into_update()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(DATABASE_WRITE)?;

    let database = state
        .app
        .databases
        .update_database_status(claims, uuid.into_inner().into(), update)
        .await
        .map_err(into_status_error)?;

    Ok(Json(database.into()))
}
