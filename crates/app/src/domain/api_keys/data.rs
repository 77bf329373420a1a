//! API Key Data

use std::fmt;

use jiff::{SignedDuration, Timestamp};

use crate::{auth::Permissions, domain::api_keys::records::ApiKeyRecord};

/// Lifetime of a key issued without an explicit expiry.
pub const DEFAULT_API_KEY_TTL: SignedDuration = SignedDuration::from_hours(24 * 90);

/// New API Key Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApiKey {
    pub name: String,

    /// Must be covered by the issuing caller's permissions.
    pub scopes: Permissions,

    /// Defaults to [`DEFAULT_API_KEY_TTL`] from issuance.
    pub expires_at: Option<Timestamp>,
}

/// A freshly issued key. The plaintext is never retrievable again.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedApiKey {
    pub key: String,
    pub record: ApiKeyRecord,
}

impl fmt::Debug for IssuedApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedApiKey")
            .field("key", &"**redacted**")
            .field("record", &self.record)
            .finish()
    }
}
