//! Telemetry lifecycle.

use opentelemetry::global;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace::SdkTracerProvider};
use tracing::error;

use crate::config::ServerConfig;

use super::{ObservabilityError, RequestLogging, telemetry};

/// Installed subscriber plus the OTLP pipeline when export is enabled.
#[derive(Debug)]
pub(crate) struct Observability {
    tracer_provider: Option<SdkTracerProvider>,
    request_logging: RequestLogging,
}

impl Observability {
    pub(crate) fn init(config: &ServerConfig) -> Result<Self, ObservabilityError> {
        let otel = &config.observability;

        let tracer_provider = if otel.enabled {
            global::set_text_map_propagator(TraceContextPropagator::new());

            Some(telemetry::tracer_provider(otel)?)
        } else {
            None
        };

        telemetry::install_subscriber(&config.logging, otel, tracer_provider.as_ref())?;

        Ok(Self {
            tracer_provider,
            request_logging: RequestLogging::new(&config.logging, otel),
        })
    }

    /// Request middleware configured from the same settings.
    pub(crate) fn request_logging(&self) -> RequestLogging {
        self.request_logging
    }

    /// Flush buffered spans.
    pub(crate) fn shutdown(self) {
        if let Some(provider) = self.tracer_provider
            && let Err(source) = provider.shutdown()
        {
            error!("failed to shutdown tracer provider: {source}");
        }
    }
}
