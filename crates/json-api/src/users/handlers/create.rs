//! Create User Handler

use std::{fmt, sync::Arc};

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{auth::permissions::USER_WRITE, domain::users::data::NewUser};

use crate::{
    extensions::*,
    state::State,
    users::{errors::into_status_error, models::UserResponse},
};

/// Create User Request
#[derive(Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateUserRequest {
    pub email: String,
    pub password: String,

    #[serde(default)]
    pub display_name: String,

    /// Roles from the caller's tenant
    #[serde(default)]
    pub roles: Vec<Uuid>,
}

impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .field("display_name", &self.display_name)
            .field("roles", &self.roles)
            .finish()
    }
}

impl From<CreateUserRequest> for NewUser {
    fn from(request: CreateUserRequest) -> Self {
        NewUser {
            email: request.email,
            password: request.password,
            display_name: request.display_name,
            roles: request.roles.into_iter().map(Into::into).collect(),
        }
    }
}

/// Create User Handler
#[endpoint(
    tags("users"),
    summary = "Create User",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "User created"),
        (status_code = StatusCode::CONFLICT, description = "Email already registered"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing user.write or role escalation"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateUserRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<UserResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(USER_WRITE)?;

    let user = state
        .app
        .users
        .create_user(claims, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/api/v1/users/{}", user.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(user.into()))
}
