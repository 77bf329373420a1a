//! Provision Database Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use nexus_app::{
    auth::permissions::DATABASE_WRITE,
    domain::databases::{
        data::NewDatabase,
        records::{DatabaseEngine, SizeClass},
    },
};

use crate::{
    databases::{errors::into_status_error, models::DatabaseResponse},
    extensions::*,
    state::State,
};

/// Provision Database Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateDatabaseRequest {
    pub name: String,

    /// `postgres`, `mysql`, `mongodb` or `redis`
    pub engine: String,

    /// `small`, `medium`, `large` or `xlarge`
    #[serde(alias = "sizeClass")]
    pub size_class: String,
}

impl CreateDatabaseRequest {
    fn into_new_database(self) -> Result<NewDatabase, StatusError> {
        Ok(NewDatabase {
            engine: self
                .engine
                .parse::<DatabaseEngine>()
                .or_400("Invalid database engine")?,
            size_class: self
                .size_class
                .parse::<SizeClass>()
                .or_400("Invalid size class")?,
            name: self.name,
        })
    }
}

/// Provision Database Handler
///
/// The instance starts in `provisioning`; the provisioner reports back via the
/// status endpoint.
#[endpoint(
    tags("databases"),
    summary = "Provision Database",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Provisioning started"),
        (status_code = StatusCode::CONFLICT, description = "Name already in use"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateDatabaseRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<DatabaseResponse>, StatusError> {
    let new_database = json.into_inner().into_new_database()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(DATABASE_WRITE)?;

    let database = state
        .app
        .databases
        .provision_database(claims, new_database)
        .await
        .map_err(into_status_error)?;

    res.add_header(
        LOCATION,
        format!("/api/v1/databases/{}", database.uuid),
        true,
    )
    .or_500("failed to set location header")?
    .status_code(StatusCode::CREATED);

    Ok(Json(database.into()))
}
