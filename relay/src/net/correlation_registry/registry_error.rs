use thiserror::Error;

use crate::net::correlation::correlation_token::CorrelationToken;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
    #[error("correlation token {0} is already pending")]
    DuplicateToken(CorrelationToken),
}
