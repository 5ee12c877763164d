use std::any::Any;
use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("{message}")]
pub struct HandlerFault {
    message: String,
}

impl HandlerFault {
    pub fn new(message: impl Into<String>) -> Self {
        return HandlerFault { message: message.into() };
    }

    /// A fault describing a handler that panicked instead of answering.
    pub(crate) fn from_panic(panic: Box<dyn Any + Send>) -> Self {
        let reason = if let Some(reason) = panic.downcast_ref::<&str>() {
            reason.to_string()
        } else if let Some(reason) = panic.downcast_ref::<String>() {
            reason.clone()
        } else {
            "unknown panic".to_string()
        };
        return HandlerFault::new(format!("handler panicked: {}", reason));
    }

    pub fn get_message(&self) -> &str {
        return &self.message;
    }
}

/// Turns one request payload into one response payload. Invoked once per
/// delivered request, possibly concurrently for different requests.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, payload: Bytes) -> Result<Bytes, HandlerFault>;
}

pub struct FnHandler<F> {
    handler: F,
}

pub fn handler_fn<F, Fut>(handler: F) -> FnHandler<F>
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output=Result<Bytes, HandlerFault>> + Send + 'static {
    return FnHandler { handler };
}

#[async_trait]
impl<F, Fut> RequestHandler for FnHandler<F>
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output=Result<Bytes, HandlerFault>> + Send + 'static {
    async fn handle(&self, payload: Bytes) -> Result<Bytes, HandlerFault> {
        return (self.handler)(payload).await;
    }
}
