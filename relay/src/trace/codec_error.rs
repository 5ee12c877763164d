use thiserror::Error;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum CodecError {
    #[error("traceparent header is missing")]
    MissingTraceparent,
    #[error("traceparent {0} does not carry a valid span context")]
    MalformedTraceparent(String),
}
