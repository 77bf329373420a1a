//! User Models

use std::string::ToString;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{domain::users::records::UserRecord, pagination::Page};

/// User Response
///
/// Password hashes never leave the service.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UserResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub status: String,
    pub roles: Vec<Uuid>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        UserResponse {
            id: user.uuid.into_uuid(),
            tenant_id: user.tenant.into_uuid(),
            email: user.email,
            display_name: user.display_name,
            status: user.status.to_string(),
            roles: user.roles.into_iter().map(Into::into).collect(),
            created_at: user.created_at.to_string(),
            updated_at: user.updated_at.to_string(),
            deleted_at: user.deleted_at.as_ref().map(ToString::to_string),
        }
    }
}

/// User List Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UsersResponse {
    pub items: Vec<UserResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl From<Page<UserRecord>> for UsersResponse {
    fn from(page: Page<UserRecord>) -> Self {
        UsersResponse {
            items: page.items.into_iter().map(Into::into).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}
