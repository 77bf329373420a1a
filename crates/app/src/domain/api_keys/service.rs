//! API keys service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    auth::Claims,
    database::Db,
    domain::{
        api_keys::{
            data::{DEFAULT_API_KEY_TTL, IssuedApiKey, NewApiKey},
            errors::ApiKeysServiceError,
            key::{
                format_api_key, generate_api_key_prefix, generate_api_key_secret,
                hash_api_key_secret, parse_api_key, verify_api_key_secret,
            },
            records::{ApiKeyRecord, ApiKeyUuid},
            repository::{ApiKeyRow, PgApiKeysRepository},
        },
        audit::{
            PgAuditRepository,
            data::{AuditAction, NewAuditEntry},
        },
        roles::data::first_invalid_permission,
    },
    pagination::{Page, PageRequest},
};

#[derive(Debug, Clone)]
pub struct PgApiKeysService {
    db: Db,
    repository: PgApiKeysRepository,
    audit: PgAuditRepository,
}

impl PgApiKeysService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgApiKeysRepository::new(),
            audit: PgAuditRepository::new(),
        }
    }

    /// Best-effort `last_used_at` update; authentication never fails on it.
    async fn touch(&self, claims: &Claims, key: ApiKeyUuid) {
        let result = async {
            let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

            self.repository.touch_last_used(&mut tx, claims.tenant, key).await?;

            tx.commit().await
        }
        .await;

        if let Err(error) = result {
            warn!(api_key_uuid = %key, "failed to record api key use: {error}");
        }
    }
}

#[async_trait]
impl ApiKeysService for PgApiKeysService {
    #[tracing::instrument(
        name = "api_keys.service.issue_api_key",
        skip(self, claims, key),
        fields(tenant_uuid = %claims.tenant, api_key_uuid = tracing::field::Empty),
        err
    )]
    async fn issue_api_key(
        &self,
        claims: &Claims,
        key: NewApiKey,
    ) -> Result<IssuedApiKey, ApiKeysServiceError> {
        if key.scopes.is_empty() {
            return Err(ApiKeysServiceError::NoScopes);
        }

        if let Some(invalid) = first_invalid_permission(&key.scopes) {
            return Err(ApiKeysServiceError::InvalidScope(invalid));
        }

        if !claims.permissions.covers(&key.scopes) {
            return Err(ApiKeysServiceError::EscalatesPrivileges);
        }

        let now = Timestamp::now();

        let expires_at = match key.expires_at {
            Some(expires_at) => expires_at,
            None => now
                .checked_add(DEFAULT_API_KEY_TTL)
                .map_err(|_ignored| ApiKeysServiceError::InvalidExpiry)?,
        };

        if expires_at <= now {
            return Err(ApiKeysServiceError::InvalidExpiry);
        }

        let uuid = ApiKeyUuid::new();
        let prefix = generate_api_key_prefix();
        let secret = generate_api_key_secret();
        let plaintext = format_api_key(&prefix, &secret);
        let secret_hash = hash_api_key_secret(&secret);

        tracing::Span::current().record("api_key_uuid", tracing::field::display(uuid));

        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let record = self
            .repository
            .create_api_key(
                &mut tx,
                claims.tenant,
                ApiKeyRow {
                    uuid,
                    owner: claims.subject,
                    name: key.name.trim(),
                    prefix: &prefix,
                    secret_hash: &secret_hash,
                    scopes: &key.scopes,
                    expires_at,
                },
            )
            .await?;

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::ApiKeyCreate, uuid).with_metadata(json!({
                    "name": record.name,
                    "prefix": record.prefix,
                    "scopes": record.scopes.iter().collect::<Vec<_>>(),
                })),
            )
            .await?;

        tx.commit().await?;

        info!(api_key_uuid = %uuid, prefix = %prefix, "issued api key");

        Ok(IssuedApiKey {
            key: plaintext,
            record,
        })
    }

    async fn get_api_key(
        &self,
        claims: &Claims,
        key: ApiKeyUuid,
    ) -> Result<ApiKeyRecord, ApiKeysServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let key = self.repository.get_api_key(&mut tx, claims.tenant, key).await?;

        tx.commit().await?;

        Ok(key)
    }

    async fn list_api_keys(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<ApiKeyRecord>, ApiKeysServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let (keys, total) = self
            .repository
            .list_api_keys(&mut tx, claims.tenant, &page)
            .await?;

        tx.commit().await?;

        Ok(Page::new(keys, &page, total))
    }

    #[tracing::instrument(
        name = "api_keys.service.revoke_api_key",
        skip(self, claims),
        fields(tenant_uuid = %claims.tenant, api_key_uuid = %key),
        err
    )]
    async fn revoke_api_key(
        &self,
        claims: &Claims,
        key: ApiKeyUuid,
    ) -> Result<ApiKeyRecord, ApiKeysServiceError> {
        let mut tx = self.db.begin_tenant_transaction(claims.tenant).await?;

        let Some(revoked) = self
            .repository
            .revoke_api_key(&mut tx, claims.tenant, key)
            .await?
        else {
            // Distinguish an unknown key from one that is already revoked.
            self.repository.get_api_key(&mut tx, claims.tenant, key).await?;

            return Err(ApiKeysServiceError::AlreadyRevoked);
        };

        self.audit
            .record(
                &mut tx,
                claims.tenant,
                NewAuditEntry::by(claims, AuditAction::ApiKeyRevoke, key)
                    .with_metadata(json!({ "prefix": revoked.prefix })),
            )
            .await?;

        tx.commit().await?;

        info!(api_key_uuid = %key, "revoked api key");

        Ok(revoked)
    }

    #[tracing::instrument(name = "api_keys.service.authenticate", skip(self, key), err)]
    async fn authenticate(&self, key: &str) -> Result<Claims, ApiKeysServiceError> {
        let parsed = parse_api_key(key).map_err(|_ignored| ApiKeysServiceError::InvalidKey)?;

        let mut tx = self.db.begin_unscoped_transaction().await?;

        let lookup = self.repository.find_by_prefix(&mut tx, &parsed.prefix).await?;

        tx.commit().await?;

        let Some(lookup) = lookup else {
            return Err(ApiKeysServiceError::InvalidKey);
        };

        if !verify_api_key_secret(&parsed.secret, &lookup.secret_hash)
            || !lookup.is_usable_at(Timestamp::now())
        {
            return Err(ApiKeysServiceError::InvalidKey);
        }

        let claims = Claims {
            subject: lookup.owner,
            tenant: lookup.tenant,
            email: lookup.owner_email,
            permissions: lookup.scopes,
            issued_at: lookup.created_at,
            expires_at: lookup.expires_at,
        };

        self.touch(&claims, lookup.uuid).await;

        Ok(claims)
    }
}

#[automock]
#[async_trait]
pub trait ApiKeysService: Send + Sync {
    /// Issues a key owned by the caller. The plaintext is returned once.
    async fn issue_api_key(
        &self,
        claims: &Claims,
        key: NewApiKey,
    ) -> Result<IssuedApiKey, ApiKeysServiceError>;

    async fn get_api_key(
        &self,
        claims: &Claims,
        key: ApiKeyUuid,
    ) -> Result<ApiKeyRecord, ApiKeysServiceError>;

    async fn list_api_keys(
        &self,
        claims: &Claims,
        page: PageRequest,
    ) -> Result<Page<ApiKeyRecord>, ApiKeysServiceError>;

    async fn revoke_api_key(
        &self,
        claims: &Claims,
        key: ApiKeyUuid,
    ) -> Result<ApiKeyRecord, ApiKeysServiceError>;

    /// Resolves a presented `prefix.secret` key to claims for its owner,
    /// limited to the key's scopes.
    async fn authenticate(&self, key: &str) -> Result<Claims, ApiKeysServiceError>;
}
