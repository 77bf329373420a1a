//! Password hashing and policy.

use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{
        Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};

use crate::auth::{PasswordError, PasswordPolicyError, PasswordRule};

const DUMMY_PASSWORD: &str = "nexus-dummy-password";

static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Write-time password requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_mixed_case: bool,
    pub require_digit: bool,
    pub require_symbol: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_mixed_case: true,
            require_digit: true,
            require_symbol: true,
        }
    }
}

impl PasswordPolicy {
    /// Check `password`, collecting every failed rule.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordPolicyError`] when at least one rule fails.
    pub fn check(&self, password: &str) -> Result<(), PasswordPolicyError> {
        let mut violations = Vec::new();

        if password.chars().count() < self.min_length {
            violations.push(PasswordRule::MinLength(self.min_length));
        }

        if self.require_mixed_case
            && !(password.chars().any(char::is_uppercase)
                && password.chars().any(char::is_lowercase))
        {
            violations.push(PasswordRule::MixedCase);
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push(PasswordRule::Digit);
        }

        if self.require_symbol
            && !password
                .chars()
                .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            violations.push(PasswordRule::Symbol);
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PasswordPolicyError { violations })
        }
    }
}

/// Hash `password` with Argon2id and a fresh salt, returning a PHC string.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::Hash)
}

/// Verify `password` against a stored PHC string in constant time.
///
/// # Errors
///
/// Returns an error if the stored hash cannot be parsed.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(PasswordError::InvalidHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(error) => Err(PasswordError::InvalidHash(error)),
    }
}

/// [`hash_password`] on the blocking thread pool.
///
/// # Errors
///
/// Returns an error if hashing fails or the task is cancelled.
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(PasswordError::Task)?
}

/// [`verify_password`] on the blocking thread pool. A missing hash runs
/// [`verify_dummy`] instead and never matches.
///
/// # Errors
///
/// Returns an error if the stored hash is invalid or the task is cancelled.
pub async fn verify_password_blocking(
    password: String,
    stored_hash: Option<String>,
) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            verify_dummy(&password);
            Ok(false)
        }
    })
    .await
    .map_err(PasswordError::Task)?
}

/// Spend one verification on a fixed hash so unknown accounts cost the same
/// as wrong passwords.
pub fn verify_dummy(password: &str) {
    let dummy = DUMMY_HASH.get_or_init(|| hash_password(DUMMY_PASSWORD).ok());

    if let Some(hash) = dummy {
        let _matched = verify_password(password, hash);
    }
}
