use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::net::broker::consumer::Consumer;
use crate::net::broker::message::AckMode;
use crate::net::broker::transport::BrokerTransport;
use crate::net::broker::transport_error::TransportError;
use crate::net::correlation::correlation_token::CorrelationToken;
use crate::net::correlation_registry::correlation_registry::CorrelationRegistry;
use crate::net::rpc::rpc_reply::RpcReply;

/// An exclusive reply queue owned by a single call, together with the task
/// that drains it into the correlation registry.
///
/// `release` stops the listener and deletes the queue. If the call is
/// abandoned before that, dropping the destination does the same in the
/// background.
pub(crate) struct ReplyDestination {
    queue: String,
    transport: Arc<dyn BrokerTransport>,
    listener: Option<JoinHandle<()>>,
    released: bool,
}

impl ReplyDestination {
    pub(crate) async fn provision(transport: Arc<dyn BrokerTransport>) -> Result<ReplyDestination, TransportError> {
        let queue = transport.declare_exclusive_queue().await?;
        return Ok(ReplyDestination { queue, transport, listener: None, released: false });
    }

    pub(crate) async fn listen(&mut self, registry: Arc<CorrelationRegistry<RpcReply>>) -> Result<(), TransportError> {
        let consumer = self.transport.consume(&self.queue, AckMode::Auto).await?;
        self.listener = Some(tokio::spawn(Self::resolve_replies(consumer, registry)));
        return Ok(());
    }

    pub(crate) fn get_queue(&self) -> &str {
        return &self.queue;
    }

    pub(crate) async fn release(mut self) {
        self.released = true;
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        if let Err(err) = self.transport.delete_queue(&self.queue).await {
            warn!(queue = %self.queue, error = %err, "could not release reply queue");
        }
    }

    async fn resolve_replies(mut consumer: Consumer, registry: Arc<CorrelationRegistry<RpcReply>>) {
        while let Some(delivery) = consumer.next_delivery().await {
            let token = match delivery.message.properties.correlation_id.clone() {
                None => {
                    warn!(queue = %consumer.get_queue(), "ignoring reply without a correlation id");
                    continue;
                }
                Some(correlation_id) => CorrelationToken::from(correlation_id),
            };
            if !registry.resolve(&token, RpcReply::from_message(delivery.message)) {
                debug!(correlation_token = %token, "discarding reply for a token that is no longer pending");
            }
        }
    }
}

impl Drop for ReplyDestination {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        if let Ok(runtime) = Handle::try_current() {
            let transport = self.transport.clone();
            let queue = std::mem::take(&mut self.queue);
            runtime.spawn(async move {
                if let Err(err) = transport.delete_queue(&queue).await {
                    warn!(queue = %queue, error = %err, "could not release abandoned reply queue");
                }
            });
        }
    }
}
