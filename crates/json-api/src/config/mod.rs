//! Server configuration module

use clap::Parser;
use jiff::SignedDuration;

use crate::config::{
    auth::AuthConfig,
    db::DatabaseConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    rate_limit::RateLimitConfig,
    server::ServerRuntimeConfig,
};

pub(crate) mod auth;
pub(crate) mod db;
pub(crate) mod observability;
pub(crate) mod rate_limit;
pub(crate) mod server;

/// Nexus JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "nexus-json", about = "Nexus JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Token and password settings.
    #[command(flatten)]
    pub auth: AuthConfig,

    /// Per-subject request limits.
    #[command(flatten)]
    pub rate_limit: RateLimitConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }
}

/// Parse a duration such as `30s`, `1h 30m` or `PT24H`.
pub(crate) fn parse_duration(value: &str) -> Result<SignedDuration, String> {
    let duration = value
        .trim()
        .parse::<SignedDuration>()
        .map_err(|error| format!("invalid duration `{value}`: {error}"))?;

    if duration.is_positive() {
        Ok(duration)
    } else {
        Err(format!("duration `{value}` must be positive"))
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn friendly_durations_parse() -> TestResult {
        assert_eq!(parse_duration("24h")?, SignedDuration::from_hours(24));
        assert_eq!(parse_duration("90m")?, SignedDuration::from_mins(90));
        assert_eq!(parse_duration("1h 30m")?, SignedDuration::from_mins(90));
        assert_eq!(parse_duration("PT30S")?, SignedDuration::from_secs(30));

        Ok(())
    }

    #[test]
    fn non_positive_and_garbage_durations_are_rejected() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("-5m").is_err());
        assert!(parse_duration("soon").is_err());
    }

    #[test]
    fn defaults_load_with_only_a_secret() -> TestResult {
        let config = ServerConfig::try_parse_from(["nexus-json", "--jwt-secret", "s3cret"])?;

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout, SignedDuration::from_secs(30));
        assert_eq!(config.auth.jwt_expiry, SignedDuration::from_hours(24));
        assert_eq!(config.rate_limit.requests, 100);
        assert_eq!(config.rate_limit.window, SignedDuration::from_mins(1));

        Ok(())
    }
}
