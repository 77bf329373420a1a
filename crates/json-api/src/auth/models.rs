//! Auth Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{
    auth::{IssuedToken, Permissions},
    domain::users::records::UserRecord,
};

/// Issued Token Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    /// Signed bearer token
    pub token: String,

    /// Always `Bearer`
    pub token_type: String,

    /// When the token stops being accepted
    pub expires_at: String,

    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub permissions: Vec<String>,
}

impl TokenResponse {
    pub(crate) fn new(issued: IssuedToken, user: &UserRecord, permissions: Permissions) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer".to_string(),
            expires_at: issued.expires_at.to_string(),
            user_id: user.uuid.into_uuid(),
            tenant_id: user.tenant.into_uuid(),
            email: user.email.clone(),
            permissions: permissions.into_vec(),
        }
    }
}
