use async_trait::async_trait;

use crate::net::broker::consumer::Consumer;
use crate::net::broker::message::{AckMode, DeliveryTag, Message};
use crate::net::broker::transport_error::TransportError;

/// Capabilities the RPC client and worker need from a message broker.
///
/// One implementation instance stands for one broker connection and is shared
/// by every call made through it.
#[async_trait]
pub trait BrokerTransport: Send + Sync {
    /// Declares a queue that survives broker restarts. Declaring an existing
    /// queue is not an error.
    async fn declare_durable_queue(&self, queue: &str) -> Result<(), TransportError>;

    /// Declares an exclusive, auto-deleted queue with a broker-generated name.
    async fn declare_exclusive_queue(&self) -> Result<String, TransportError>;

    async fn delete_queue(&self, queue: &str) -> Result<(), TransportError>;

    async fn publish(&self, queue: &str, message: Message) -> Result<(), TransportError>;

    async fn consume(&self, queue: &str, ack_mode: AckMode) -> Result<Consumer, TransportError>;

    async fn ack(&self, delivery_tag: DeliveryTag) -> Result<(), TransportError>;
}
