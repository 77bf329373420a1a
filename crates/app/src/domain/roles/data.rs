//! Role Data

use crate::auth::{Permissions, is_valid_permission};

/// New Role Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    pub name: String,
    pub permissions: Permissions,
}

/// Role Update Data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub permissions: Option<Permissions>,
}

/// First malformed permission string in `permissions`, if any.
pub(crate) fn first_invalid_permission(permissions: &Permissions) -> Option<String> {
    permissions
        .iter()
        .find(|permission| !is_valid_permission(permission))
        .map(str::to_string)
}
