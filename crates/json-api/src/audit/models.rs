//! Audit Models

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use nexus_app::{domain::audit::records::AuditRecord, pagination::Page};

/// Audit Record Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AuditRecordResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,

    /// Absent for system events such as subscription expiry.
    pub user_id: Option<Uuid>,

    pub action: String,
    pub target_kind: String,
    pub target_id: Uuid,
    pub metadata: Value,
    pub created_at: String,
}

impl From<AuditRecord> for AuditRecordResponse {
    fn from(record: AuditRecord) -> Self {
        AuditRecordResponse {
            id: record.uuid.into_uuid(),
            tenant_id: record.tenant.into_uuid(),
            user_id: record.actor.map(Into::into),
            action: record.action,
            target_kind: record.target_kind,
            target_id: record.target_uuid,
            metadata: record.metadata,
            created_at: record.created_at.to_string(),
        }
    }
}

/// Audit Log Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AuditRecordsResponse {
    pub items: Vec<AuditRecordResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl From<Page<AuditRecord>> for AuditRecordsResponse {
    fn from(page: Page<AuditRecord>) -> Self {
        AuditRecordsResponse {
            items: page.items.into_iter().map(Into::into).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}
