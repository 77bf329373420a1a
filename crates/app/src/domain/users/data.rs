//! User Data

use std::fmt;

use crate::{
    auth::Permissions,
    domain::{
        roles::records::RoleUuid,
        tenants::records::TenantUuid,
        users::records::{UserRecord, UserStatus},
    },
};

/// New User Data
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub roles: Vec<RoleUuid>,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .field("display_name", &self.display_name)
            .field("roles", &self.roles)
            .finish()
    }
}

/// User Update Data
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub display_name: Option<String>,
    pub status: Option<UserStatus>,

    /// Replaces the full role set when present.
    pub roles: Option<Vec<RoleUuid>>,

    pub password: Option<String>,
}

impl fmt::Debug for UserUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserUpdate")
            .field("display_name", &self.display_name)
            .field("status", &self.status)
            .field("roles", &self.roles)
            .field("password", &self.password.as_ref().map(|_| "**redacted**"))
            .finish()
    }
}

impl UserUpdate {
    /// Names of the fields this update touches.
    pub(crate) fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("display_name", self.display_name.is_some()),
            ("status", self.status.is_some()),
            ("roles", self.roles.is_some()),
            ("password", self.password.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, changed)| changed.then_some(name))
        .collect()
    }
}

/// Login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,

    /// Disambiguates an email registered in more than one tenant.
    pub tenant: Option<TenantUuid>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// A user whose credentials checked out, with their effective permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user: UserRecord,
    pub permissions: Permissions,
}

/// Trim and lower-case an email, rejecting obviously malformed addresses.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();

    let (local, domain) = email.split_once('@')?;

    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
    {
        return None;
    }

    Some(email)
}

/// Sorted, de-duplicated role identifiers.
pub(crate) fn dedup_roles(roles: &[RoleUuid]) -> Vec<RoleUuid> {
    let mut roles = roles.to_vec();

    roles.sort_unstable();
    roles.dedup();

    roles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Alice@T.Example ").as_deref(),
            Some("alice@t.example")
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        assert!(normalize_email("no-at-sign").is_none());
        assert!(normalize_email("@t.example").is_none());
        assert!(normalize_email("alice@").is_none());
        assert!(normalize_email("a@b@c").is_none());
        assert!(normalize_email("al ice@t.example").is_none());
    }

    #[test]
    fn changed_fields_omit_untouched_values() {
        let update = UserUpdate {
            display_name: Some("Alice".to_string()),
            password: Some("secret".to_string()),
            ..UserUpdate::default()
        };

        assert_eq!(update.changed_fields(), vec!["display_name", "password"]);
        assert!(!format!("{update:?}").contains("secret"));
    }
}
