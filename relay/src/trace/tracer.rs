use opentelemetry::trace::{SpanKind, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::Context;
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};

use crate::trace::span::SpanScope;

pub const INSTRUMENTATION_SCOPE: &str = "relay";

/// Starts spans on a tracer provider. A span started with a parent context
/// shares the parent's trace id, records the parent's span id and inherits its
/// baggage; without a parent, or with a context that has no span, it begins a
/// new trace. The provider decides sampling and where finished spans go.
#[derive(Clone)]
pub struct Tracer {
    tracer: SdkTracer,
}

impl Tracer {
    pub fn new(provider: &SdkTracerProvider) -> Self {
        return Tracer { tracer: provider.tracer(INSTRUMENTATION_SCOPE) };
    }

    pub fn start_span(&self, name: &str, kind: SpanKind, parent: Option<&Context>) -> SpanScope {
        let parent = match parent {
            None => Context::new(),
            Some(parent) => parent.clone(),
        };
        let span = self.tracer
            .span_builder(name.to_string())
            .with_kind(kind)
            .start_with_context(&self.tracer, &parent);
        return SpanScope::new(name.to_string(), parent.with_span(span));
    }

    pub fn start_root_span(&self, name: &str, kind: SpanKind) -> SpanScope {
        return self.start_span(name, kind, None);
    }
}

#[cfg(test)]
mod tests {
    use opentelemetry::baggage::BaggageExt;
    use opentelemetry::trace::{SpanContext, SpanId, SpanKind, TraceContextExt, TraceFlags, TraceId, TraceState};
    use opentelemetry::{Context, KeyValue};
    use opentelemetry_sdk::trace::{InMemorySpanExporter, InMemorySpanExporterBuilder, SdkTracerProvider};

    use crate::trace::tracer::Tracer;

    fn tracer_with_exporter() -> (Tracer, InMemorySpanExporter) {
        let exporter = InMemorySpanExporterBuilder::new().build();
        let provider = SdkTracerProvider::builder().with_simple_exporter(exporter.clone()).build();
        return (Tracer::new(&provider), exporter);
    }

    #[test]
    fn child_span_shares_the_trace() {
        let (tracer, exporter) = tracer_with_exporter();

        let parent = tracer.start_root_span("employees-page", SpanKind::Server);
        let child = tracer.start_span("send-rpc-request", SpanKind::Client, Some(parent.context()));
        let (parent_context, child_context) = (parent.span_context(), child.span_context());
        child.end();
        parent.end();

        assert_eq!(parent_context.trace_id(), child_context.trace_id());
        assert_ne!(parent_context.span_id(), child_context.span_id());

        let spans = exporter.get_finished_spans().unwrap();
        let child = spans.iter().find(|span| span.name == "send-rpc-request").unwrap();
        assert_eq!(parent_context.span_id(), child.parent_span_id);
    }

    #[test]
    fn root_span_starts_a_new_trace() {
        let (tracer, exporter) = tracer_with_exporter();

        let first = tracer.start_root_span("employees-page", SpanKind::Server);
        let second = tracer.start_root_span("employees-page", SpanKind::Server);

        assert_ne!(first.span_context().trace_id(), second.span_context().trace_id());
        first.end();
        assert_eq!(SpanId::INVALID, exporter.get_finished_spans().unwrap()[0].parent_span_id);
    }

    #[test]
    fn continue_a_remote_trace_with_its_baggage() {
        let (tracer, _exporter) = tracer_with_exporter();
        let remote = SpanContext::new(
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(),
            SpanId::from_hex("00f067aa0ba902b7").unwrap(),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );
        let parent = Context::new()
            .with_remote_span_context(remote.clone())
            .with_baggage(vec![KeyValue::new("tenant", "acme")]);

        let span = tracer.start_span("process-rpc-request", SpanKind::Server, Some(&parent));

        assert_eq!(remote.trace_id(), span.span_context().trace_id());
        assert_eq!(Some("acme".to_string()), span.context().baggage().get("tenant").map(|value| value.as_str().to_string()));
    }

    #[test]
    fn unsampled_parent_is_not_exported() {
        let (tracer, exporter) = tracer_with_exporter();
        let remote = SpanContext::new(
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(),
            SpanId::from_hex("00f067aa0ba902b7").unwrap(),
            TraceFlags::default(),
            true,
            TraceState::default(),
        );

        tracer.start_span("process-rpc-request", SpanKind::Server, Some(&Context::new().with_remote_span_context(remote))).end();

        assert!(exporter.get_finished_spans().unwrap().is_empty());
    }
}
