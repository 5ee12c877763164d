pub mod logging;
pub mod tracer_provider;
