//! API Key Handlers

pub(crate) mod create;
pub(crate) mod get;
pub(crate) mod index;
pub(crate) mod revoke;

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use nexus_app::{
        auth::Permissions,
        domain::api_keys::records::{ApiKeyRecord, ApiKeyStatus, ApiKeyUuid},
    };

    use crate::test_helpers::{TEST_TENANT_UUID, TEST_USER_UUID};

    pub(super) fn make_api_key(uuid: ApiKeyUuid) -> ApiKeyRecord {
        ApiKeyRecord {
            uuid,
            tenant: TEST_TENANT_UUID,
            owner: TEST_USER_UUID,
            name: "ci".to_string(),
            prefix: "nxab12cd34".to_string(),
            scopes: ["sheets.read"].into_iter().collect::<Permissions>(),
            status: ApiKeyStatus::Active,
            expires_at: Timestamp::MAX,
            last_used_at: None,
            revoked_at: None,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }
}
