//! Role Records

use jiff::Timestamp;

use crate::{auth::Permissions, domain::tenants::records::TenantUuid, uuids::TypedUuid};

/// Role UUID
pub type RoleUuid = TypedUuid<RoleRecord>;

/// Role Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRecord {
    pub uuid: RoleUuid,
    pub tenant: TenantUuid,
    pub name: String,
    pub permissions: Permissions,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
