//! Nexus JSON API Server

use std::{process::ExitCode, sync::Arc};

use salvo::{
    affix_state::inject,
    catch_panic::CatchPanic,
    oapi::{
        OpenApi,
        security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme},
        swagger_ui::SwaggerUi,
    },
    prelude::*,
    timeout::Timeout,
    trailing_slash::remove_slash,
};
use tracing::{error, info, warn};

use nexus_app::{
    context::AppContext,
    rate_limit::{RateLimiter, RedisRateLimiter},
};

use crate::{
    config::ServerConfig,
    observability::{Observability, metrics_handler},
    state::State,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod api_keys;
mod audit;
mod auth;
mod config;
mod databases;
mod extensions;
mod healthcheck;
mod observability;
mod rate_limit;
mod roles;
mod router;
mod shutdown;
mod spreadsheets;
mod state;
mod subscriptions;
mod tenants;
#[cfg(test)]
mod test_helpers;
mod users;

/// Nexus JSON API Server entry point
#[tokio::main]
pub async fn main() -> ExitCode {
    // Load configuration from .env and CLI arguments
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(error) => {
            #[expect(
                clippy::print_stderr,
                reason = "logging not initialized yet, must use eprintln for config errors"
            )]
            {
                eprintln!("Configuration error: {error}");
            }

            return ExitCode::FAILURE;
        }
    };

    let observability = match Observability::init(&config) {
        Ok(observability) => observability,
        Err(error) => {
            #[expect(
                clippy::print_stderr,
                reason = "tracing subscriber failed to initialize"
            )]
            {
                eprintln!("Observability error: {error}");
            }

            return ExitCode::FAILURE;
        }
    };

    let tokens = match config.auth.token_manager() {
        Ok(tokens) => tokens,
        Err(token_error) => {
            error!("invalid token configuration: {token_error}");

            return ExitCode::FAILURE;
        }
    };

    let policy = config.auth.password_policy();

    let app = match &config.database.database_url {
        Some(url) => AppContext::from_database_url(url, tokens, policy).await,
        None => AppContext::connect(&config.database.settings(), tokens, policy).await,
    };

    let app = match app {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialize app context: {init_error}");

            return ExitCode::FAILURE;
        }
    };

    let rate_limiter = match connect_rate_limiter(&config).await {
        Ok(rate_limiter) => rate_limiter,
        Err(()) => return ExitCode::FAILURE,
    };

    let addr = config.socket_addr();

    info!("Starting server on {addr}");

    // Bind server
    let listener = TcpListener::new(addr).bind().await;

    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(observability.request_logging())
        .hoop(Timeout::new(config.server.request_timeout.unsigned_abs()))
        .hoop(inject(State::shared(app, rate_limiter)))
        .push(Router::with_path("health").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(metrics_handler))
        .push(router::api_router());

    let doc = OpenApi::new("Nexus API", env!("CARGO_PKG_VERSION"))
        .add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
        .add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "`ApiKey <key>`",
            ))),
        )
        .merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    let server = Server::new(listener);

    let handle = server.handle();
    let grace = config.server.shutdown_grace_period.unsigned_abs();

    // Listen for shutdown signal
    tokio::spawn(async move {
        if let Err(error) = shutdown::listen(handle, grace).await {
            error!("failed to listen for shutdown signal: {error}");
        }
    });

    // Start serving requests
    server.serve(router).await;

    observability.shutdown();

    ExitCode::SUCCESS
}

/// Rate limiting is off unless `REDIS_URL` is set.
async fn connect_rate_limiter(config: &ServerConfig) -> Result<Option<Arc<dyn RateLimiter>>, ()> {
    let Some(url) = &config.rate_limit.redis_url else {
        warn!("REDIS_URL not set, rate limiting disabled");

        return Ok(None);
    };

    let settings = config.rate_limit.settings().map_err(|settings_error| {
        error!("invalid rate limit configuration: {settings_error}");
    })?;

    let limiter = RedisRateLimiter::connect(url, settings)
        .await
        .map_err(|connect_error| {
            error!("failed to connect to rate limit store: {connect_error}");
        })?;

    info!(
        requests = settings.requests,
        window = %settings.window,
        "rate limiting enabled"
    );

    Ok(Some(Arc::new(limiter)))
}
