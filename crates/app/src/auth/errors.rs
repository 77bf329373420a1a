//! Auth errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is outside its validity window")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("token signing secret is empty")]
    MissingSecret,

    #[error("token lifetime must be positive")]
    InvalidLifetime,

    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password")]
    Hash(#[source] argon2::password_hash::Error),

    #[error("stored password hash is not a valid PHC string")]
    InvalidHash(#[source] argon2::password_hash::Error),

    #[error("password task failed")]
    Task(#[source] tokio::task::JoinError),
}

/// One unmet password rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordRule {
    #[error("password must be at least {0} characters")]
    MinLength(usize),

    #[error("password must contain upper and lower case letters")]
    MixedCase,

    #[error("password must contain a digit")]
    Digit,

    #[error("password must contain a symbol")]
    Symbol,
}

/// Every rule a candidate password failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("password does not meet policy")]
pub struct PasswordPolicyError {
    pub violations: Vec<PasswordRule>,
}

impl PasswordPolicyError {
    /// Human-readable list of the failed rules.
    #[must_use]
    pub fn details(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}
