//! Logging, tracing and metrics.

use thiserror::Error;

mod init;
mod metrics;
mod request;
mod telemetry;

pub(crate) use init::Observability;
pub(crate) use metrics::{metrics_handler, record_rate_limited};
pub(crate) use request::RequestLogging;

#[derive(Debug, Error)]
pub(crate) enum ObservabilityError {
    #[error("failed to build OTLP exporter: {0}")]
    OtlpExporter(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("failed to initialise tracing subscriber: {0}")]
    TracingSubscriber(#[from] tracing_subscriber::util::TryInitError),
}
