//! Role Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{domain::roles::records::RoleRecord, pagination::Page};

/// Role Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RoleResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub permissions: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<RoleRecord> for RoleResponse {
    fn from(role: RoleRecord) -> Self {
        RoleResponse {
            id: role.uuid.into_uuid(),
            tenant_id: role.tenant.into_uuid(),
            name: role.name,
            permissions: role.permissions.into_vec(),
            created_at: role.created_at.to_string(),
            updated_at: role.updated_at.to_string(),
        }
    }
}

/// Role List Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RolesResponse {
    pub items: Vec<RoleResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl From<Page<RoleRecord>> for RolesResponse {
    fn from(page: Page<RoleRecord>) -> Self {
        RolesResponse {
            items: page.items.into_iter().map(Into::into).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}
