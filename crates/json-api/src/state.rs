//! State

use std::sync::Arc;

use nexus_app::{context::AppContext, rate_limit::RateLimiter};

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) app: AppContext,

    /// Absent when no shared counter store is configured.
    pub(crate) rate_limiter: Option<Arc<dyn RateLimiter>>,
}

impl State {
    #[must_use]
    pub(crate) fn new(app: AppContext, rate_limiter: Option<Arc<dyn RateLimiter>>) -> Self {
        Self { app, rate_limiter }
    }

    #[must_use]
    pub(crate) fn shared(app: AppContext, rate_limiter: Option<Arc<dyn RateLimiter>>) -> Arc<Self> {
        Arc::new(Self::new(app, rate_limiter))
    }
}
