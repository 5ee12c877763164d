use std::error::Error;

use opentelemetry::trace::{SpanContext, Status, TraceContextExt};
use opentelemetry::{Context, Key, KeyValue, Value};
use tracing::info_span;

/// An open span together with the context it was started in. Child spans and
/// outgoing trace headers are derived from [`SpanScope::context`]. The span
/// ends when [`SpanScope::end`] is called or when the scope is dropped,
/// whichever comes first.
pub struct SpanScope {
    name: String,
    context: Context,
}

impl SpanScope {
    pub(crate) fn new(name: String, context: Context) -> Self {
        return SpanScope { name, context };
    }

    pub fn set_attribute(&self, key: impl Into<Key>, value: impl Into<Value>) {
        self.context.span().set_attribute(KeyValue::new(key, value));
    }

    pub fn add_event(&self, name: impl Into<String>, attributes: Vec<KeyValue>) {
        self.context.span().add_event(name.into(), attributes);
    }

    /// Adds an `exception` event and marks the span as failed.
    pub fn record_fault(&self, fault: &dyn Error) {
        let span = self.context.span();
        span.record_error(fault);
        span.set_status(Status::error(fault.to_string()));
    }

    pub fn set_status(&self, status: Status) {
        self.context.span().set_status(status);
    }

    pub fn context(&self) -> &Context {
        return &self.context;
    }

    pub fn span_context(&self) -> SpanContext {
        return self.context.span().span_context().clone();
    }

    pub fn get_name(&self) -> &str {
        return &self.name;
    }

    /// A `tracing` span carrying the trace and span ids, so log lines emitted
    /// while it is entered correlate with the exported span.
    pub fn log_span(&self) -> tracing::Span {
        let span_context = self.span_context();
        return info_span!(
            "span",
            span_name = %self.name,
            trace_id = %span_context.trace_id(),
            span_id = %span_context.span_id()
        );
    }

    pub fn end(self) {
        drop(self);
    }
}

impl Drop for SpanScope {
    fn drop(&mut self) {
        self.context.span().end();
    }
}
