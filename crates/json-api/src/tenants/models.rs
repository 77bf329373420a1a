//! Tenant Models

use std::string::ToString;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{domain::tenants::records::TenantRecord, pagination::Page};

/// Tenant Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TenantResponse {
    pub id: Uuid,
    pub name: String,

    /// `active`, `suspended` or `deleted`
    pub status: String,

    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl From<TenantRecord> for TenantResponse {
    fn from(tenant: TenantRecord) -> Self {
        TenantResponse {
            id: tenant.uuid.into_uuid(),
            name: tenant.name,
            status: tenant.status.to_string(),
            created_at: tenant.created_at.to_string(),
            updated_at: tenant.updated_at.to_string(),
            deleted_at: tenant.deleted_at.as_ref().map(ToString::to_string),
        }
    }
}

/// Tenant List Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TenantsResponse {
    pub items: Vec<TenantResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl From<Page<TenantRecord>> for TenantsResponse {
    fn from(page: Page<TenantRecord>) -> Self {
        TenantsResponse {
            items: page.items.into_iter().map(Into::into).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}
