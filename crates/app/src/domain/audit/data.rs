//! Audit Data

use jiff::Timestamp;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{auth::Claims, domain::users::records::UserUuid};

/// Entity kinds an audit record can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTarget {
    Tenant,
    User,
    Role,
    ApiKey,
    Database,
    Subscription,
    Spreadsheet,
    Sheet,
}

impl AuditTarget {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::User => "user",
            Self::Role => "role",
            Self::ApiKey => "api_key",
            Self::Database => "database",
            Self::Subscription => "subscription",
            Self::Spreadsheet => "spreadsheet",
            Self::Sheet => "sheet",
        }
    }
}

/// Mutations recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    TenantCreate,
    TenantUpdate,
    TenantDelete,
    UserCreate,
    UserUpdate,
    UserDelete,
    RoleCreate,
    RoleUpdate,
    RoleDelete,
    ApiKeyCreate,
    ApiKeyRevoke,
    DatabaseProvision,
    DatabaseScale,
    DatabaseStatus,
    DatabaseDelete,
    SubscriptionCreate,
    SubscriptionUpdate,
    SubscriptionCancel,
    SubscriptionExpire,
    SpreadsheetCreate,
    SpreadsheetUpdate,
    SpreadsheetDelete,
    SheetCreate,
    SheetUpdate,
    SheetDelete,
    CellsUpdate,
    CellsBatchUpdate,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TenantCreate => "tenant.create",
            Self::TenantUpdate => "tenant.update",
            Self::TenantDelete => "tenant.delete",
            Self::UserCreate => "user.create",
            Self::UserUpdate => "user.update",
            Self::UserDelete => "user.delete",
            Self::RoleCreate => "role.create",
            Self::RoleUpdate => "role.update",
            Self::RoleDelete => "role.delete",
            Self::ApiKeyCreate => "api_key.create",
            Self::ApiKeyRevoke => "api_key.revoke",
            Self::DatabaseProvision => "database.provision",
            Self::DatabaseScale => "database.scale",
            Self::DatabaseStatus => "database.status",
            Self::DatabaseDelete => "database.delete",
            Self::SubscriptionCreate => "subscription.create",
            Self::SubscriptionUpdate => "subscription.update",
            Self::SubscriptionCancel => "subscription.cancel",
            Self::SubscriptionExpire => "subscription.expire",
            Self::SpreadsheetCreate => "spreadsheet.create",
            Self::SpreadsheetUpdate => "spreadsheet.update",
            Self::SpreadsheetDelete => "spreadsheet.delete",
            Self::SheetCreate => "sheet.create",
            Self::SheetUpdate => "sheet.update",
            Self::SheetDelete => "sheet.delete",
            Self::CellsUpdate => "cells.update",
            Self::CellsBatchUpdate => "cells.batch_update",
        }
    }

    /// Kind of entity this action targets.
    #[must_use]
    pub const fn target(self) -> AuditTarget {
        match self {
            Self::TenantCreate | Self::TenantUpdate | Self::TenantDelete => AuditTarget::Tenant,
            Self::UserCreate | Self::UserUpdate | Self::UserDelete => AuditTarget::User,
            Self::RoleCreate | Self::RoleUpdate | Self::RoleDelete => AuditTarget::Role,
            Self::ApiKeyCreate | Self::ApiKeyRevoke => AuditTarget::ApiKey,
            Self::DatabaseProvision
            | Self::DatabaseScale
            | Self::DatabaseStatus
            | Self::DatabaseDelete => AuditTarget::Database,
            Self::SubscriptionCreate
            | Self::SubscriptionUpdate
            | Self::SubscriptionCancel
            | Self::SubscriptionExpire => AuditTarget::Subscription,
            Self::SpreadsheetCreate | Self::SpreadsheetUpdate | Self::SpreadsheetDelete => {
                AuditTarget::Spreadsheet
            }
            Self::SheetCreate
            | Self::SheetUpdate
            | Self::SheetDelete
            | Self::CellsUpdate
            | Self::CellsBatchUpdate => AuditTarget::Sheet,
        }
    }
}

/// New Audit Entry Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub actor: Option<UserUuid>,
    pub action: AuditAction,
    pub target_uuid: Uuid,
    pub metadata: Value,
}

impl NewAuditEntry {
    /// Entry attributed to the caller in `claims`.
    #[must_use]
    pub fn by(claims: &Claims, action: AuditAction, target: impl Into<Uuid>) -> Self {
        Self {
            actor: Some(claims.subject),
            action,
            target_uuid: target.into(),
            metadata: Value::Object(Map::new()),
        }
    }

    /// Entry for a system-originated event with no acting user.
    #[must_use]
    pub fn system(action: AuditAction, target: impl Into<Uuid>) -> Self {
        Self {
            actor: None,
            action,
            target_uuid: target.into(),
            metadata: Value::Object(Map::new()),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Audit list filter; `from` is inclusive and `to` exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    pub actor: Option<UserUuid>,
    pub action: Option<String>,
    pub target_kind: Option<String>,
    pub target_uuid: Option<Uuid>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}
