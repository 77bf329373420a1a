//! Role Handlers

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod update;

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use nexus_app::{
        auth::Permissions,
        domain::roles::records::{RoleRecord, RoleUuid},
    };

    use crate::test_helpers::TEST_TENANT_UUID;

    pub(super) fn make_role(uuid: RoleUuid) -> RoleRecord {
        RoleRecord {
            uuid,
            tenant: TEST_TENANT_UUID,
            name: "editor".to_string(),
            permissions: ["sheets.read", "sheets.write"].into_iter().collect::<Permissions>(),
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }
}
