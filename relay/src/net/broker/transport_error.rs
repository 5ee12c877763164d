use thiserror::Error;

use crate::net::broker::message::DeliveryTag;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum TransportError {
    #[error("broker is unreachable: {0}")]
    Disconnected(String),
    #[error("queue {0} does not exist")]
    QueueNotFound(String),
    #[error("queue {0} already has an active consumer")]
    ConsumerAlreadyActive(String),
    #[error("publish to queue {queue} failed: {reason}")]
    PublishFailed { queue: String, reason: String },
    #[error("delivery tag {0} is not awaiting acknowledgement")]
    UnknownDeliveryTag(DeliveryTag),
}
