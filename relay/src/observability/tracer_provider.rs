use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use thiserror::Error;
use tracing::info;

use crate::config::relay_config::TracingConfig;

#[derive(Debug, Error)]
pub enum TracingSetupError {
    #[error("can not build span exporter for {endpoint}: {reason}")]
    Exporter { endpoint: String, reason: String },
}

/// A provider that batches finished spans and ships them to the configured
/// collector over OTLP/HTTP. Call `shutdown` on it before exiting so the last
/// batch is flushed.
pub fn init_tracer_provider(config: &TracingConfig) -> Result<SdkTracerProvider, TracingSetupError> {
    let exporter = SpanExporter::builder()
        .with_http()
        .with_endpoint(config.collector_endpoint.as_str())
        .build()
        .map_err(|err| TracingSetupError::Exporter {
            endpoint: config.collector_endpoint.clone(),
            reason: err.to_string(),
        })?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(Resource::builder().with_service_name(config.service_name.clone()).build())
        .build();
    info!(service = %config.service_name, collector_endpoint = %config.collector_endpoint, "span export configured");
    return Ok(provider);
}
