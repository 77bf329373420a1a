//! Per-request span, access log and metrics.

mod request_ids;
mod spans;
mod trace_parent;

use std::time::{Duration, Instant};

use salvo::prelude::*;
use tracing::{Instrument as _, error, field, info, warn};
use tracing_opentelemetry::OpenTelemetrySpanExt as _;

use crate::{
    config::observability::{LoggingConfig, ObservabilityConfig},
    extensions::*,
};

use self::request_ids::RequestId;
use super::metrics;

/// Paths served without a span or access log line.
const UNLOGGED_PATHS: &[&str] = &["/metrics", "/health"];

/// Request logging middleware; runs outermost so it also sees auth failures.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequestLogging {
    slow_request_threshold: Duration,
    propagate_parent: bool,
}

impl RequestLogging {
    pub(crate) fn new(logging: &LoggingConfig, otel: &ObservabilityConfig) -> Self {
        Self {
            slow_request_threshold: logging.slow_request_threshold.unsigned_abs(),
            propagate_parent: otel.continues_remote_traces(),
        }
    }
}

#[handler]
impl RequestLogging {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        if UNLOGGED_PATHS.contains(&req.uri().path()) {
            ctrl.call_next(req, depot, res).await;

            return;
        }

        let started = Instant::now();
        let _in_flight = metrics::InFlight::enter();

        let request_id = RequestId::of(req);

        request_id.echo(res);

        let method = req.method().to_string();
        let path = req.uri().path().to_owned();
        let route = spans::route_template(&path);

        let span = tracing::info_span!(
            parent: None,
            "http.request",
            otel.name = %format!("{method} {route}"),
            otel.kind = "server",
            request_id = %request_id,
            method = %method,
            path = %path,
            remote_addr = %req.remote_addr(),
            tenant_id = field::Empty,
            user_id = field::Empty,
            status = field::Empty,
            duration_ms = field::Empty,
        );

        if self.propagate_parent
            && let Some(parent) = trace_parent::remote_parent(req.headers())
            && let Err(source) = span.set_parent(parent)
        {
            warn!("failed to set remote parent on request span: {source}");
        }

        ctrl.call_next(req, depot, res)
            .instrument(span.clone())
            .await;

        let elapsed = started.elapsed();
        let status = res.status_code.unwrap_or(StatusCode::OK);
        let duration_ms = elapsed.as_millis();

        metrics::observe_request(&method, &route, status, elapsed.as_secs_f64());

        if let Ok(claims) = depot.claims_or_401() {
            span.record("tenant_id", field::display(claims.tenant));
            span.record("user_id", field::display(claims.subject));
        }

        span.record("status", status.as_u16());
        span.record("duration_ms", duration_ms);

        span.in_scope(|| {
            if status.is_server_error() {
                error!(status = status.as_u16(), duration_ms, "request.failed");
            } else if status.is_client_error() {
                warn!(status = status.as_u16(), duration_ms, "request.rejected");
            } else {
                info!(status = status.as_u16(), duration_ms, "request.completed");
            }

            if elapsed > self.slow_request_threshold {
                warn!(
                    duration_ms,
                    threshold_ms = self.slow_request_threshold.as_millis(),
                    "slow request"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use super::{request_ids::REQUEST_ID_HEADER, *};

    #[handler]
    async fn ok(res: &mut Response) {
        res.render("ok");
    }

    fn make_service() -> Service {
        let logging = RequestLogging {
            slow_request_threshold: Duration::from_secs(1),
            propagate_parent: false,
        };

        Service::new(
            Router::new()
                .hoop(logging)
                .push(Router::with_path("health").get(ok))
                .push(Router::with_path("api/v1/roles").get(ok)),
        )
    }

    #[tokio::test]
    async fn caller_request_id_is_echoed() -> TestResult {
        let mut res = TestClient::get("http://example.com/api/v1/roles")
            .add_header(REQUEST_ID_HEADER, "trace-7", true)
            .send(&make_service())
            .await;

        assert_eq!(
            res.headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("trace-7")
        );
        assert_eq!(res.take_string().await?, "ok");

        Ok(())
    }

    #[tokio::test]
    async fn health_checks_are_not_tagged() {
        let res = TestClient::get("http://example.com/health")
            .send(&make_service())
            .await;

        assert!(res.headers().get(REQUEST_ID_HEADER).is_none());
    }
}
