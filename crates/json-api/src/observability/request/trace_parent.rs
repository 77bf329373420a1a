//! W3C trace context from inbound headers.

use opentelemetry::{Context, global, propagation::Extractor, trace::TraceContextExt as _};
use salvo::http::{HeaderMap, HeaderName};

struct Headers<'a>(&'a HeaderMap);

impl Extractor for Headers<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

/// The caller's span context, if the headers carry a valid one.
pub(super) fn remote_parent(headers: &HeaderMap) -> Option<Context> {
    global::get_text_map_propagator(|propagator| {
        // Extract onto an empty context so a missing header never adopts the
        // current in-process span.
        let context = propagator.extract_with_context(&Context::new(), &Headers(headers));

        context.span().span_context().is_valid().then_some(context)
    })
}
