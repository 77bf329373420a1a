//! Tenant Data

use crate::{
    auth::Permissions,
    domain::{
        roles::records::RoleRecord,
        tenants::records::{TenantRecord, TenantStatus},
        users::records::UserRecord,
    },
};

/// New Tenant Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTenant {
    /// Tenant name to persist.
    pub name: String,
}

/// Tenant Update Data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantUpdate {
    pub name: Option<String>,
    pub status: Option<TenantStatus>,
}

/// Self-service signup: a tenant together with its first administrator.
#[derive(Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub tenant_name: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
}

impl std::fmt::Debug for NewRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewRegistration")
            .field("tenant_name", &self.tenant_name)
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Everything created by a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub tenant: TenantRecord,
    pub role: RoleRecord,
    pub user: UserRecord,
    pub permissions: Permissions,
}

/// Rows touched by a tenant deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TenantDeletion {
    pub users: u64,
    pub api_keys: u64,
    pub databases: u64,
    pub subscriptions: u64,
}
