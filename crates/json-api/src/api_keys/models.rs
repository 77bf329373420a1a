//! API Key Models

use std::string::ToString;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nexus_app::{
    domain::api_keys::{data::IssuedApiKey, records::ApiKeyRecord},
    pagination::Page,
};

/// API Key Response
///
/// Only the public prefix is ever shown after issuance.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ApiKeyResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub prefix: String,
    pub scopes: Vec<String>,

    /// `active` or `revoked`
    pub status: String,

    pub expires_at: String,
    pub last_used_at: Option<String>,
    pub revoked_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ApiKeyRecord> for ApiKeyResponse {
    fn from(key: ApiKeyRecord) -> Self {
        ApiKeyResponse {
            id: key.uuid.into_uuid(),
            tenant_id: key.tenant.into_uuid(),
            user_id: key.owner.into_uuid(),
            name: key.name,
            prefix: key.prefix,
            scopes: key.scopes.into_vec(),
            status: key.status.as_str().to_string(),
            expires_at: key.expires_at.to_string(),
            last_used_at: key.last_used_at.as_ref().map(ToString::to_string),
            revoked_at: key.revoked_at.as_ref().map(ToString::to_string),
            created_at: key.created_at.to_string(),
            updated_at: key.updated_at.to_string(),
        }
    }
}

/// Issued API Key Response
///
/// The only response that carries the plaintext key.
#[derive(Serialize, Deserialize, ToSchema)]
pub(crate) struct IssuedApiKeyResponse {
    pub key: String,

    #[serde(flatten)]
    pub api_key: ApiKeyResponse,
}

impl std::fmt::Debug for IssuedApiKeyResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedApiKeyResponse")
            .field("key", &"**redacted**")
            .field("api_key", &self.api_key)
            .finish()
    }
}

impl From<IssuedApiKey> for IssuedApiKeyResponse {
    fn from(issued: IssuedApiKey) -> Self {
        IssuedApiKeyResponse {
            key: issued.key,
            api_key: issued.record.into(),
        }
    }
}

/// API Key List Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ApiKeysResponse {
    pub items: Vec<ApiKeyResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl From<Page<ApiKeyRecord>> for ApiKeysResponse {
    fn from(page: Page<ApiKeyRecord>) -> Self {
        ApiKeysResponse {
            items: page.items.into_iter().map(Into::into).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}
