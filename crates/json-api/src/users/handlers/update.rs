//! Update User Handler

use std::{fmt, sync::Arc};

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
    auth::permissions::USER_WRITE,
    domain::users::{data::UserUpdate, records::UserStatus},
};

use crate::{
    extensions::*,
    state::State,
    users::{errors::into_status_error, models::UserResponse},
};

/// Update User Request
///
/// Absent fields are left unchanged; `roles` replaces the whole set.
#[derive(Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateUserRequest {
    pub display_name: Option<String>,

    /// `active` or `suspended`
    pub status: Option<String>,

    pub roles: Option<Vec<Uuid>>,
    pub password: Option<String>,
}

impl fmt::Debug for UpdateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateUserRequest")
            .field("display_name", &self.display_name)
            .field("status", &self.status)
            .field("roles", &self.roles)
            .field("password", &self.password.as_ref().map(|_| "**redacted**"))
            .finish()
    }
}

impl UpdateUserRequest {
    fn into_update(self) -> Result<UserUpdate, StatusError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<UserStatus>)
            .transpose()
            .or_400("Invalid user status")?;

        Ok(UserUpdate {
            display_name: self.display_name,
            status,
            roles: self
                .roles
                .map(|roles| roles.into_iter().map(Into::into).collect()),
            password: self.password,
        })
    }
}

/// Update User Handler
#[endpoint(
    tags("users"),
    summary = "Update User",
    security(("bearer_auth" = []), ("api_key" = [])),
    responses(
        (status_code = StatusCode::OK, description = "User updated"),
        (status_code = StatusCode::NOT_FOUND, description = "User not found"),
        (status_code = StatusCode::BAD_REQUEST, description = "Bad Request"),
        (status_code = StatusCode::FORBIDDEN, description = "Missing user.write or role escalation"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid status transition"),
    ),
)]
pub(crate) async fn handler(
    uuid: PathParam<Uuid>,
    json: JsonBody<UpdateUserRequest>,
    depot: &mut Depot,
) -> Result<Json<UserResponse>, StatusError> {
    let update = json.into_inner().into_update()?;
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let claims = depot.authorize_or_403(USER_WRITE)?;

    let user = state
        .app
        .users
        .update_user(claims, uuid.into_inner().into(), update)
        .await
        .map_err(into_status_error)?;

    Ok(Json(user.into()))
}
