//! Signed bearer tokens.

use std::fmt;

use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{Claims, Permissions, TokenError},
    domain::{tenants::records::TenantUuid, users::records::UserUuid},
};

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL: SignedDuration = SignedDuration::from_hours(24);

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    sub: Uuid,
    #[serde(alias = "tenantId")]
    tenant_id: Uuid,
    #[serde(default)]
    email: String,
    #[serde(default)]
    permissions: Vec<String>,
    iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<i64>,
    exp: i64,
}

/// A freshly issued token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: Timestamp,
}

/// Issues and verifies HS256 tokens with a single process-wide secret.
#[derive(Clone)]
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: SignedDuration,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("secret", &"**redacted**")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenManager {
    /// # Errors
    ///
    /// Returns [`TokenError::MissingSecret`] for an empty secret and
    /// [`TokenError::InvalidLifetime`] for a non-positive lifetime.
    pub fn new(secret: &[u8], ttl: SignedDuration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        if !ttl.is_positive() {
            return Err(TokenError::InvalidLifetime);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    #[must_use]
    pub fn ttl(&self) -> SignedDuration {
        self.ttl
    }

    /// Issue a token valid from now for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue(
        &self,
        subject: UserUuid,
        tenant: TenantUuid,
        email: &str,
        permissions: &Permissions,
    ) -> Result<IssuedToken, TokenError> {
        self.issue_at(subject, tenant, email, permissions, Timestamp::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails or the expiry overflows.
    pub fn issue_at(
        &self,
        subject: UserUuid,
        tenant: TenantUuid,
        email: &str,
        permissions: &Permissions,
        now: Timestamp,
    ) -> Result<IssuedToken, TokenError> {
        let expires_at = now
            .checked_add(self.ttl)
            .map_err(|_overflow| TokenError::InvalidLifetime)?;

        let payload = TokenPayload {
            sub: subject.into_uuid(),
            tenant_id: tenant.into_uuid(),
            email: email.to_string(),
            permissions: permissions.clone().into_vec(),
            iat: now.as_second(),
            nbf: Some(now.as_second()),
            exp: expires_at.as_second(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)
            .map_err(TokenError::Signing)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    ///
    /// Fails with [`TokenError::InvalidSignature`], [`TokenError::Expired`]
    /// or [`TokenError::Malformed`].
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Timestamp::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// A token whose expiry equals `now` is rejected, as is one presented
    /// before its not-before boundary.
    ///
    /// # Errors
    ///
    /// Fails with [`TokenError::InvalidSignature`], [`TokenError::Expired`]
    /// or [`TokenError::Malformed`].
    pub fn verify_at(&self, token: &str, now: Timestamp) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);

        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let payload = decode::<TokenPayload>(token, &self.decoding, &validation)
            .map_err(|error| match error.kind() {
                JwtErrorKind::InvalidSignature | JwtErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    TokenError::Expired
                }
                _ => TokenError::Malformed,
            })?
            .claims;

        let now = now.as_second();

        if payload.exp <= now || payload.nbf.is_some_and(|nbf| now < nbf) {
            return Err(TokenError::Expired);
        }

        Ok(Claims {
            subject: UserUuid::from_uuid(payload.sub),
            tenant: TenantUuid::from_uuid(payload.tenant_id),
            email: payload.email,
            permissions: payload.permissions.into(),
            issued_at: Timestamp::from_second(payload.iat).map_err(|_range| TokenError::Malformed)?,
            expires_at: Timestamp::from_second(payload.exp)
                .map_err(|_range| TokenError::Malformed)?,
        })
    }
}
