//! Prometheus metrics and the `/metrics` endpoint.

use std::sync::OnceLock;

use prometheus::{
    Encoder as _, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use salvo::{
    Request, Response, handler,
    http::{StatusCode, header::CONTENT_TYPE},
};
use tracing::error;

const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug)]
struct HttpMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
    requests_in_flight: IntGauge,
    rate_limited_total: IntCounter,
}

impl HttpMetrics {
    fn build() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(
                "nexus_json_http_requests_total",
                "HTTP requests by method, route and status.",
            ),
            &["method", "route", "status_class", "status_code"],
        )?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "nexus_json_http_request_duration_seconds",
                "HTTP request latency by method and route.",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            &["method", "route"],
        )?;

        let requests_in_flight = IntGauge::new(
            "nexus_json_http_requests_in_flight",
            "HTTP requests currently being served.",
        )?;

        let rate_limited_total = IntCounter::new(
            "nexus_json_rate_limited_requests_total",
            "Requests rejected by the per-caller rate limit.",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;
        registry.register(Box::new(requests_in_flight.clone()))?;
        registry.register(Box::new(rate_limited_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration_seconds,
            requests_in_flight,
            rate_limited_total,
        })
    }
}

static HTTP_METRICS: OnceLock<Option<HttpMetrics>> = OnceLock::new();

fn metrics() -> Option<&'static HttpMetrics> {
    HTTP_METRICS
        .get_or_init(|| {
            HttpMetrics::build()
                .inspect_err(|source| error!("failed to build HTTP metrics: {source}"))
                .ok()
        })
        .as_ref()
}

/// Holds the in-flight gauge up for as long as it lives.
#[derive(Debug)]
pub(super) struct InFlight(Option<&'static HttpMetrics>);

impl InFlight {
    pub(super) fn enter() -> Self {
        let metrics = metrics();

        if let Some(metrics) = metrics {
            metrics.requests_in_flight.inc();
        }

        Self(metrics)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(metrics) = self.0 {
            metrics.requests_in_flight.dec();
        }
    }
}

pub(super) fn observe_request(method: &str, route: &str, status: StatusCode, seconds: f64) {
    let Some(metrics) = metrics() else {
        return;
    };

    let status_code = status.as_str();

    metrics
        .requests_total
        .with_label_values(&[method, route, status_class(status), status_code])
        .inc();

    metrics
        .request_duration_seconds
        .with_label_values(&[method, route])
        .observe(seconds);
}

pub(crate) fn record_rate_limited() {
    if let Some(metrics) = metrics() {
        metrics.rate_limited_total.inc();
    }
}

fn status_class(status: StatusCode) -> &'static str {
    if status.is_informational() {
        "1xx"
    } else if status.is_success() {
        "2xx"
    } else if status.is_redirection() {
        "3xx"
    } else if status.is_client_error() {
        "4xx"
    } else if status.is_server_error() {
        "5xx"
    } else {
        "other"
    }
}

#[handler]
pub(crate) async fn metrics_handler(_req: &mut Request, res: &mut Response) {
    let Some(metrics) = metrics() else {
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

        return;
    };

    let encoder = TextEncoder::new();

    let body = match encoder.encode_to_string(&metrics.registry.gather()) {
        Ok(body) => body,
        Err(source) => {
            error!("failed to encode metrics: {source}");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

            return;
        }
    };

    if let Err(source) = res.add_header(CONTENT_TYPE, encoder.format_type(), true) {
        error!("failed to set metrics content type: {source}");
    }

    res.render(body);
}
