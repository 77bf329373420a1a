//! Auth Config

use clap::Args;
use jiff::SignedDuration;

use nexus_app::auth::{PasswordPolicy, TokenError, TokenManager};

use crate::config::parse_duration;

/// Token signing and password policy settings.
#[derive(Debug, Args)]
pub struct AuthConfig {
    /// HS256 signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Issued token lifetime
    #[arg(long, env = "JWT_EXPIRY", default_value = "24h", value_parser = parse_duration)]
    pub jwt_expiry: SignedDuration,

    /// Minimum password length
    #[arg(long, env = "PASSWORD_MIN_LENGTH", default_value_t = 8)]
    pub password_min_length: usize,
}

impl AuthConfig {
    /// # Errors
    ///
    /// Fails when the secret is empty.
    pub fn token_manager(&self) -> Result<TokenManager, TokenError> {
        TokenManager::new(self.jwt_secret.as_bytes(), self.jwt_expiry)
    }

    #[must_use]
    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy {
            min_length: self.password_min_length,
            ..PasswordPolicy::default()
        }
    }
}
