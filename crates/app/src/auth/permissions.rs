//! Permission catalogue checked by the HTTP gate.

pub const TENANT_CREATE: &str = "tenant.create";
pub const TENANT_READ: &str = "tenant.read";
pub const TENANT_WRITE: &str = "tenant.write";
pub const TENANT_DELETE: &str = "tenant.delete";

pub const USER_READ: &str = "user.read";
pub const USER_WRITE: &str = "user.write";

pub const ROLE_READ: &str = "role.read";
pub const ROLE_WRITE: &str = "role.write";

pub const API_KEY_READ: &str = "api_key.read";
pub const API_KEY_WRITE: &str = "api_key.write";

pub const DATABASE_READ: &str = "database.read";
pub const DATABASE_WRITE: &str = "database.write";

pub const SUBSCRIPTION_READ: &str = "subscription.read";
pub const SUBSCRIPTION_WRITE: &str = "subscription.write";

pub const AUDIT_READ: &str = "audit.read";

pub const SHEETS_READ: &str = "sheets.read";
pub const SHEETS_WRITE: &str = "sheets.write";

/// Every named permission, excluding the wildcard.
pub const ALL: &[&str] = &[
    TENANT_CREATE,
    TENANT_READ,
    TENANT_WRITE,
    TENANT_DELETE,
    USER_READ,
    USER_WRITE,
    ROLE_READ,
    ROLE_WRITE,
    API_KEY_READ,
    API_KEY_WRITE,
    DATABASE_READ,
    DATABASE_WRITE,
    SUBSCRIPTION_READ,
    SUBSCRIPTION_WRITE,
    AUDIT_READ,
    SHEETS_READ,
    SHEETS_WRITE,
];
