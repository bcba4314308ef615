//! Trace context carried explicitly through a configuration read.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the binary. A read runs inside a `read_config` span so every event it
//! emits inherits the caller's trace id.

use tracing::{Span, field, info_span};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceContext {
    trace_id: Option<String>
}

impl TraceContext {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: Some(trace_id.into())
        }
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Span wrapping one read. `trace_id` stays empty when none was bound.
    pub fn read_span(&self, slug: &str) -> Span {
        let span = info_span!("read_config", trace_id = field::Empty, slug);
        if let Some(trace_id) = &self.trace_id {
            span.record("trace_id", trace_id.as_str());
        }
        span
    }
}

impl From<Option<String>> for TraceContext {
    fn from(trace_id: Option<String>) -> Self {
        Self { trace_id }
    }
}
