//! Per-subject request rate limiting backed by Redis.

use std::fmt;

use async_trait::async_trait;
use jiff::SignedDuration;
use mockall::automock;
use redis::{Client, RedisError, aio::ConnectionManager};
use thiserror::Error;
use tracing::debug;

/// Requests allowed per window when none are configured.
pub const DEFAULT_RATE_LIMIT_REQUESTS: u64 = 100;

/// Window length when none is configured.
pub const DEFAULT_RATE_LIMIT_WINDOW: SignedDuration = SignedDuration::from_mins(1);

const KEY_PREFIX: &str = "ratelimit:";

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit window must be at least one second")]
    InvalidWindow,

    #[error("rate limit must allow at least one request")]
    InvalidLimit,

    #[error("rate limit store error")]
    Store(#[source] RedisError),
}

impl From<RedisError> for RateLimitError {
    fn from(error: RedisError) -> Self {
        Self::Store(error)
    }
}

/// Fixed-window limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub requests: u64,
    pub window: SignedDuration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests: DEFAULT_RATE_LIMIT_REQUESTS,
            window: DEFAULT_RATE_LIMIT_WINDOW,
        }
    }
}

impl RateLimitSettings {
    /// # Errors
    ///
    /// Rejects a zero limit and windows shorter than one second.
    pub fn new(requests: u64, window: SignedDuration) -> Result<Self, RateLimitError> {
        if requests == 0 {
            return Err(RateLimitError::InvalidLimit);
        }

        if window.as_secs() < 1 {
            return Err(RateLimitError::InvalidWindow);
        }

        Ok(Self { requests, window })
    }

    fn window_seconds(&self) -> i64 {
        self.window.as_secs()
    }
}

/// Outcome of counting one request against a subject's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u64 },
    Limited { limit: u64 },
}

impl RateDecision {
    /// Decide for a window that has now seen `count` requests.
    #[must_use]
    pub fn from_count(count: u64, limit: u64) -> Self {
        if count > limit {
            Self::Limited { limit }
        } else {
            Self::Allowed {
                remaining: limit - count,
            }
        }
    }

    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[automock]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request for `subject` and decide whether it may proceed.
    async fn check(&self, subject: &str) -> Result<RateDecision, RateLimitError>;
}

/// Fixed-window counter: `INCR`, then `EXPIRE` on the first hit of a window.
#[derive(Clone)]
pub struct RedisRateLimiter {
    connection: ConnectionManager,
    settings: RateLimitSettings,
}

impl fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisRateLimiter")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RedisRateLimiter {
    /// Connect to the Redis instance at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the first connection fails.
    pub async fn connect(url: &str, settings: RateLimitSettings) -> Result<Self, RateLimitError> {
        let client = Client::open(url)?;
        let connection = client.get_connection_manager().await?;

        Ok(Self {
            connection,
            settings,
        })
    }

    #[must_use]
    pub fn settings(&self) -> RateLimitSettings {
        self.settings
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    #[tracing::instrument(name = "rate_limit.check", skip(self), err)]
    async fn check(&self, subject: &str) -> Result<RateDecision, RateLimitError> {
        let key = format!("{KEY_PREFIX}{subject}");
        let mut connection = self.connection.clone();

        let count: u64 = redis::cmd("INCR")
            .arg(&key)
            .query_async(&mut connection)
            .await?;

        if count == 1 {
            redis::cmd("EXPIRE")
                .arg(&key)
                .arg(self.settings.window_seconds())
                .exec_async(&mut connection)
                .await?;
        }

        let decision = RateDecision::from_count(count, self.settings.requests);

        debug!(subject, count, allowed = decision.is_allowed(), "counted request");

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use testcontainers::runners::AsyncRunner;
    use testcontainers_modules::redis::{REDIS_PORT, Redis};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn decision_allows_up_to_the_limit() {
        assert_eq!(
            RateDecision::from_count(1, 3),
            RateDecision::Allowed { remaining: 2 }
        );
        assert_eq!(
            RateDecision::from_count(3, 3),
            RateDecision::Allowed { remaining: 0 }
        );
        assert_eq!(
            RateDecision::from_count(4, 3),
            RateDecision::Limited { limit: 3 }
        );
    }

    #[test]
    fn settings_reject_degenerate_limits() {
        assert!(matches!(
            RateLimitSettings::new(0, SignedDuration::from_mins(1)),
            Err(RateLimitError::InvalidLimit)
        ));
        assert!(matches!(
            RateLimitSettings::new(10, SignedDuration::from_millis(500)),
            Err(RateLimitError::InvalidWindow)
        ));
        assert!(RateLimitSettings::new(10, SignedDuration::from_secs(1)).is_ok());
    }

    #[tokio::test]
    async fn redis_counter_limits_each_subject_separately() -> TestResult {
        let container = Redis::default().start().await?;
        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(REDIS_PORT).await?;

        let limiter = RedisRateLimiter::connect(
            &format!("redis://{host}:{port}"),
            RateLimitSettings::new(2, SignedDuration::from_mins(1))?,
        )
        .await?;

        assert!(limiter.check("alice").await?.is_allowed());
        assert!(limiter.check("alice").await?.is_allowed());
        assert_eq!(
            limiter.check("alice").await?,
            RateDecision::Limited { limit: 2 }
        );
        assert_eq!(
            limiter.check("bob").await?,
            RateDecision::Allowed { remaining: 1 }
        );

        Ok(())
    }

    #[tokio::test]
    async fn first_hit_sets_the_window_expiry() -> TestResult {
        let container = Redis::default().start().await?;
        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(REDIS_PORT).await?;
        let url = format!("redis://{host}:{port}");

        let limiter = RedisRateLimiter::connect(&url, RateLimitSettings::default()).await?;

        limiter.check("carol").await?;

        let mut connection = Client::open(url.as_str())?
            .get_connection_manager()
            .await?;

        let ttl: i64 = redis::cmd("TTL")
            .arg("ratelimit:carol")
            .query_async(&mut connection)
            .await?;

        assert!((1..=60).contains(&ttl), "expected a window ttl, got {ttl}");

        Ok(())
    }
}
