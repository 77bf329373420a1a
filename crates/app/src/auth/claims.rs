//! Verified, request-scoped authorization facts.

use std::collections::BTreeSet;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::domain::{tenants::records::TenantUuid, users::records::UserUuid};

/// Permission that matches every other permission.
pub const WILDCARD_PERMISSION: &str = "*";

/// A set of opaque dotted permission strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeSet<String>);

impl Permissions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the set holds `required` exactly or the wildcard.
    #[must_use]
    pub fn allows(&self, required: &str) -> bool {
        self.0.contains(WILDCARD_PERMISSION) || self.0.contains(required)
    }

    /// Whether every permission in `other` is allowed by this set.
    ///
    /// Granting the wildcard requires holding the wildcard.
    #[must_use]
    pub fn covers(&self, other: &Permissions) -> bool {
        other.iter().all(|permission| {
            if permission == WILDCARD_PERMISSION {
                self.is_wildcard()
            } else {
                self.allows(permission)
            }
        })
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.0.contains(WILDCARD_PERMISSION)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: Permissions) {
        self.0.extend(other.0);
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0.into_iter().collect()
    }
}

impl FromIterator<String> for Permissions {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for Permissions {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Permissions {
    fn from(value: Vec<String>) -> Self {
        value.into_iter().collect()
    }
}

/// Whether `permission` is a well-formed permission string.
#[must_use]
pub fn is_valid_permission(permission: &str) -> bool {
    !permission.is_empty() && !permission.chars().any(char::is_whitespace)
}

/// Claims carried by every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Acting user.
    pub subject: UserUuid,

    /// Tenant every data access is scoped to.
    pub tenant: TenantUuid,

    /// Acting user's email.
    pub email: String,

    /// Effective permission set.
    pub permissions: Permissions,

    /// When the credential was issued.
    pub issued_at: Timestamp,

    /// When the credential stops being accepted.
    pub expires_at: Timestamp,
}

impl Claims {
    #[must_use]
    pub fn allows(&self, required: &str) -> bool {
        self.permissions.allows(required)
    }
}
