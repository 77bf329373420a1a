//! Logging and tracing settings.

use clap::{Args, ValueEnum};
use jiff::SignedDuration;

use crate::config::parse_duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One line per event, for terminals
    Compact,

    /// One JSON object per event, for log shippers
    Json,
}

#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Requests slower than this are logged at `warn`
    #[arg(long, env = "SLOW_REQUEST_THRESHOLD", default_value = "1s", value_parser = parse_duration)]
    pub slow_request_threshold: SignedDuration,
}

/// OpenTelemetry trace export. Off unless `OTEL_ENABLED` is set.
#[derive(Debug, Args)]
pub struct ObservabilityConfig {
    #[arg(long = "otel-enabled", env = "OTEL_ENABLED", default_value_t = false)]
    pub enabled: bool,

    /// Continue traces from an incoming `traceparent` header
    #[arg(long = "otel-propagate-parent", env = "OTEL_PARENT_PROPAGATION_ENABLED", default_value_t = false)]
    pub propagate_parent: bool,

    /// OTLP gRPC collector
    #[arg(
        long = "otel-endpoint",
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub endpoint: String,

    #[arg(
        long = "otel-export-timeout",
        env = "OTEL_EXPORTER_OTLP_TIMEOUT",
        default_value = "3s",
        value_parser = parse_duration
    )]
    pub export_timeout: SignedDuration,

    #[arg(long = "otel-service-name", env = "OTEL_SERVICE_NAME", default_value = "nexus-json")]
    pub service_name: String,

    #[arg(long = "otel-service-version", env = "OTEL_SERVICE_VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    pub service_version: String,

    #[arg(long = "otel-environment", env = "OTEL_DEPLOYMENT_ENVIRONMENT", default_value = "development")]
    pub environment: String,

    /// Fraction of root traces kept, between 0 and 1
    #[arg(long = "otel-sample-ratio", env = "OTEL_TRACE_SAMPLE_RATIO", default_value_t = 1.0, value_parser = parse_ratio)]
    pub sample_ratio: f64,
}

impl ObservabilityConfig {
    /// Parent propagation only means something while spans are exported.
    #[must_use]
    pub fn continues_remote_traces(&self) -> bool {
        self.enabled && self.propagate_parent
    }
}

fn parse_ratio(value: &str) -> Result<f64, String> {
    let ratio: f64 = value
        .trim()
        .parse()
        .map_err(|error| format!("invalid ratio `{value}`: {error}"))?;

    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(format!("ratio `{value}` must be between 0 and 1"))
    }
}
