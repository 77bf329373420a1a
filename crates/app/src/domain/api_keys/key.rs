//! API key formatting, parsing, and secret hashing.

use std::fmt;

use rand::{Rng, RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroize;

/// Leading characters of every key prefix.
pub const API_KEY_PREFIX: &str = "nx";

/// Random base36 characters following [`API_KEY_PREFIX`].
pub const API_KEY_PREFIX_RANDOM_CHARS: usize = 8;

/// Number of secret bytes encoded in a key.
pub const API_KEY_SECRET_BYTES: usize = 32;

const API_KEY_PREFIX_LEN: usize = API_KEY_PREFIX.len() + API_KEY_PREFIX_RANDOM_CHARS;

const API_KEY_SECRET_HEX_CHARS: usize = API_KEY_SECRET_BYTES * 2;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Clone)]
pub struct ApiKeySecret {
    bytes: [u8; API_KEY_SECRET_BYTES],
}

impl ApiKeySecret {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; API_KEY_SECRET_BYTES]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; API_KEY_SECRET_BYTES] {
        &self.bytes
    }
}

impl fmt::Debug for ApiKeySecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKeySecret(**redacted**)")
    }
}

impl Drop for ApiKeySecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

/// A presented key split into its lookup prefix and secret.
#[derive(Debug, Clone)]
pub struct ParsedApiKey {
    pub prefix: String,
    pub secret: ApiKeySecret,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiKeyFormatError {
    #[error("api key format is invalid")]
    InvalidFormat,

    #[error("api key secret encoding is invalid")]
    InvalidSecretEncoding,
}

/// Generate a fresh lookup prefix, e.g. `nx4k2j9x0a`.
#[must_use]
pub fn generate_api_key_prefix() -> String {
    let mut prefix = String::with_capacity(API_KEY_PREFIX_LEN);

    prefix.push_str(API_KEY_PREFIX);

    for _ in 0..API_KEY_PREFIX_RANDOM_CHARS {
        let index = OsRng.gen_range(0..BASE36.len());

        prefix.extend(BASE36.get(index).map(|byte| char::from(*byte)));
    }

    prefix
}

#[must_use]
pub fn generate_api_key_secret() -> ApiKeySecret {
    let mut secret = [0_u8; API_KEY_SECRET_BYTES];

    OsRng.fill_bytes(&mut secret);

    ApiKeySecret::from_bytes(secret)
}

/// Render the plaintext key shown to the caller once.
#[must_use]
pub fn format_api_key(prefix: &str, secret: &ApiKeySecret) -> String {
    format!("{prefix}.{}", hex::encode(secret.as_bytes()))
}

/// Split a presented key into prefix and secret.
///
/// # Errors
///
/// Returns an error when the key does not have the `nx<8>.<64 hex>` shape.
pub fn parse_api_key(key: &str) -> Result<ParsedApiKey, ApiKeyFormatError> {
    let (prefix, secret_hex) = key.trim().split_once('.').ok_or(ApiKeyFormatError::InvalidFormat)?;

    if !is_valid_prefix(prefix) {
        return Err(ApiKeyFormatError::InvalidFormat);
    }

    if secret_hex.len() != API_KEY_SECRET_HEX_CHARS {
        return Err(ApiKeyFormatError::InvalidSecretEncoding);
    }

    let mut secret = [0_u8; API_KEY_SECRET_BYTES];

    hex::decode_to_slice(secret_hex, &mut secret)
        .map_err(|_ignored| ApiKeyFormatError::InvalidSecretEncoding)?;

    Ok(ParsedApiKey {
        prefix: prefix.to_string(),
        secret: ApiKeySecret::from_bytes(secret),
    })
}

fn is_valid_prefix(prefix: &str) -> bool {
    prefix.len() == API_KEY_PREFIX_LEN
        && prefix.starts_with(API_KEY_PREFIX)
        && prefix
            .bytes()
            .all(|byte| byte.is_ascii_digit() || byte.is_ascii_lowercase())
}

/// Hex-encoded SHA-256 of the secret, as stored.
#[must_use]
pub fn hash_api_key_secret(secret: &ApiKeySecret) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Compare a presented secret against a stored hash in constant time.
#[must_use]
pub fn verify_api_key_secret(secret: &ApiKeySecret, stored_hash: &str) -> bool {
    let mut expected = [0_u8; 32];

    if hex::decode_to_slice(stored_hash, &mut expected).is_err() {
        return false;
    }

    let actual = Sha256::digest(secret.as_bytes());

    bool::from(actual.as_slice().ct_eq(&expected))
}
