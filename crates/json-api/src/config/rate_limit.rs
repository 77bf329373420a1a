//! Rate Limit Config

use clap::Args;
use jiff::SignedDuration;

use nexus_app::rate_limit::{RateLimitError, RateLimitSettings};

use crate::config::parse_duration;

/// Per-subject request limits; disabled without `REDIS_URL`.
#[derive(Debug, Args)]
pub struct RateLimitConfig {
    /// Redis connection string for the shared counters
    #[arg(long, env = "REDIS_URL", hide_env_values = true)]
    pub redis_url: Option<String>,

    /// Requests allowed per window
    #[arg(long = "rate-limit-requests", env = "RATE_LIMIT_REQUESTS", default_value_t = 100)]
    pub requests: u64,

    /// Window length
    #[arg(
        long = "rate-limit-window",
        env = "RATE_LIMIT_WINDOW",
        default_value = "1m",
        value_parser = parse_duration
    )]
    pub window: SignedDuration,
}

impl RateLimitConfig {
    /// # Errors
    ///
    /// Rejects a zero limit or a sub-second window.
    pub fn settings(&self) -> Result<RateLimitSettings, RateLimitError> {
        RateLimitSettings::new(self.requests, self.window)
    }
}
