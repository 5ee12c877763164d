//! W3C Trace Context and Baggage propagation over message headers.
//!
//! `inject` writes `traceparent`, `tracestate` and, when the context carries
//! baggage, a `baggage` header. `extract` is fail-soft: a missing or malformed
//! `traceparent` yields a context without a span, so whatever is started from
//! it begins a new trace.

use std::collections::HashMap;

use opentelemetry::propagation::{Extractor, TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use tracing::debug;

use crate::trace::codec_error::CodecError;
use crate::trace::header_carrier::{HeaderExtractor, HeaderInjector};

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const BAGGAGE_HEADER: &str = "baggage";

pub fn propagator() -> TextMapCompositePropagator {
    return TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]);
}

pub fn inject(context: &Context) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    inject_into(context, &mut headers);
    return headers;
}

pub fn inject_into(context: &Context, headers: &mut HashMap<String, String>) {
    propagator().inject_context(context, &mut HeaderInjector(headers));
}

pub fn extract(headers: Option<&HashMap<String, String>>) -> Context {
    let headers = match headers {
        None => return Context::new(),
        Some(headers) => headers,
    };
    return match try_extract(headers) {
        Ok(context) => context,
        Err(err) => {
            debug!(error = %err, "starting a new trace, incoming trace context is unusable");
            Context::new()
        }
    };
}

/// The remote context the headers describe, baggage included. Fails when
/// there is no `traceparent` or it does not parse into a valid span context.
pub fn try_extract(headers: &HashMap<String, String>) -> Result<Context, CodecError> {
    let extractor = HeaderExtractor(headers);
    let traceparent = extractor.get(TRACEPARENT_HEADER)
        .ok_or(CodecError::MissingTraceparent)?
        .to_string();

    let context = propagator().extract_with_context(&Context::new(), &extractor);
    if !context.span().span_context().is_valid() {
        return Err(CodecError::MalformedTraceparent(traceparent));
    }
    return Ok(context);
}
