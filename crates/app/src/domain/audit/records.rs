//! Audit Records

use jiff::Timestamp;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    domain::{tenants::records::TenantUuid, users::records::UserUuid},
    uuids::TypedUuid,
};

/// Audit Record UUID
pub type AuditRecordUuid = TypedUuid<AuditRecord>;

/// Audit Record
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub uuid: AuditRecordUuid,
    pub tenant: TenantUuid,

    /// Acting user; `None` for system-originated events.
    pub actor: Option<UserUuid>,

    /// Action verb such as `user.create`.
    pub action: String,

    pub target_kind: String,
    pub target_uuid: Uuid,
    pub metadata: Value,
    pub created_at: Timestamp,
}
