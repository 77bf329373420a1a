//! API Key Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;

use crate::{
    auth::Permissions,
    domain::{UnknownVariant, tenants::records::TenantUuid, users::records::UserUuid},
    uuids::TypedUuid,
};

/// API Key UUID
pub type ApiKeyUuid = TypedUuid<ApiKeyRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyStatus {
    Active,
    Revoked,
}

impl ApiKeyStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for ApiKeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiKeyStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "revoked" => Ok(Self::Revoked),
            _ => Err(UnknownVariant::new("api key status", value)),
        }
    }
}

/// API Key Record
///
/// Carries the public prefix only; the secret hash stays in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyRecord {
    pub uuid: ApiKeyUuid,
    pub tenant: TenantUuid,
    pub owner: UserUuid,
    pub name: String,
    pub prefix: String,
    pub scopes: Permissions,
    pub status: ApiKeyStatus,
    pub expires_at: Timestamp,
    pub last_used_at: Option<Timestamp>,
    pub revoked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
