use std::time::Duration;

use thiserror::Error;

use crate::net::broker::transport_error::TransportError;
use crate::net::correlation::correlation_token::CorrelationToken;
use crate::net::correlation_registry::registry_error::RegistryError;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum RpcError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("correlation token {0} is already pending")]
    DuplicateToken(CorrelationToken),
    #[error("call {token} timed out after {after:?}")]
    Timeout { token: CorrelationToken, after: Duration },
    #[error("call {token} was cancelled")]
    Cancelled { token: CorrelationToken },
    #[error("call {token} failed in the handler: {message}")]
    HandlerFault { token: CorrelationToken, message: String },
}

impl From<RegistryError> for RpcError {
    fn from(err: RegistryError) -> Self {
        return match err {
            RegistryError::DuplicateToken(token) => RpcError::DuplicateToken(token),
        };
    }
}

impl RpcError {
    pub fn is_timeout(&self) -> bool {
        return matches!(self, RpcError::Timeout { .. });
    }
}
