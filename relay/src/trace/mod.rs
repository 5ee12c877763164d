pub mod codec_error;
pub mod header_carrier;
pub mod propagation;
pub mod span;
pub mod tracer;
