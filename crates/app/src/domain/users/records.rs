//! User Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;

use crate::{
    domain::{UnknownVariant, roles::records::RoleUuid, tenants::records::TenantUuid},
    uuids::TypedUuid,
};

/// User UUID
pub type UserUuid = TypedUuid<UserRecord>;

/// User lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Suspended,
    Deleted,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "deleted" => Ok(Self::Deleted),
            _ => Err(UnknownVariant::new("user status", value)),
        }
    }
}

/// User Record
///
/// The password hash never leaves the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uuid: UserUuid,
    pub tenant: TenantUuid,

    /// Lower-cased email, unique among the tenant's live users.
    pub email: String,

    pub display_name: String,
    pub status: UserStatus,

    /// Assigned roles, ordered by identifier.
    pub roles: Vec<RoleUuid>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}
