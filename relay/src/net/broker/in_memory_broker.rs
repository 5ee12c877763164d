use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::broker_url::BrokerUrl;
use crate::net::broker::consumer::Consumer;
use crate::net::broker::induced_failure::InducedFailure;
use crate::net::broker::message::{AckMode, Delivery, DeliveryTag, Message};
use crate::net::broker::transport::BrokerTransport;
use crate::net::broker::transport_error::TransportError;

const EXCLUSIVE_QUEUE_PREFIX: &str = "amq.gen-";

type ConsumerTag = u64;

struct InMemoryQueue {
    exclusive: bool,
    sender: UnboundedSender<Message>,
    receiver: Mutex<Option<UnboundedReceiver<Message>>>,
}

struct UnackedDelivery {
    consumer_tag: ConsumerTag,
    queue: String,
    message: Message,
}

/// Deliveries handed to manual-ack consumers and not yet acknowledged.
struct UnackedLedger {
    entries: DashMap<DeliveryTag, UnackedDelivery>,
    next_delivery_tag: AtomicU64,
    next_consumer_tag: AtomicU64,
}

impl UnackedLedger {
    fn new() -> Self {
        return UnackedLedger {
            entries: DashMap::new(),
            next_delivery_tag: AtomicU64::new(0),
            next_consumer_tag: AtomicU64::new(0),
        };
    }

    fn next_delivery_tag(&self) -> DeliveryTag {
        return self.next_delivery_tag.fetch_add(1, Ordering::SeqCst) + 1;
    }

    fn next_consumer_tag(&self) -> ConsumerTag {
        return self.next_consumer_tag.fetch_add(1, Ordering::SeqCst) + 1;
    }

    /// Removes every delivery the consumer still holds, oldest first.
    fn release(&self, consumer_tag: ConsumerTag) -> Vec<Message> {
        let mut released = Vec::new();
        self.entries.retain(|delivery_tag, unacked| {
            if unacked.consumer_tag != consumer_tag {
                return true;
            }
            released.push((*delivery_tag, unacked.message.clone()));
            return false;
        });
        released.sort_by_key(|(delivery_tag, _)| *delivery_tag);
        return released.into_iter().map(|(_, message)| message).collect();
    }
}

/// Process-local broker. Each queue is a channel; a consumer detaches the
/// queue's receiving end and hands it back when it goes away, so messages
/// published without a consumer wait in the queue. Deliveries a manual-ack
/// consumer never acknowledged are put back on the queue when it goes away.
pub struct InMemoryBroker {
    virtual_host: String,
    queues: DashMap<String, Arc<InMemoryQueue>>,
    unacked: Arc<UnackedLedger>,
    induced_failure: InducedFailure,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        return InMemoryBroker {
            virtual_host: "/".to_string(),
            queues: DashMap::new(),
            unacked: Arc::new(UnackedLedger::new()),
            induced_failure: InducedFailure::new(),
        };
    }

    pub fn connect(broker_url: &BrokerUrl) -> Result<Self, TransportError> {
        let mut broker = Self::new();
        broker.virtual_host = broker_url.get_virtual_host().to_string();
        info!(broker = %broker_url, "connected to in-memory broker");
        return Ok(broker);
    }

    pub fn get_virtual_host(&self) -> &str {
        return &self.virtual_host;
    }

    pub fn get_induced_failure(&self) -> &InducedFailure {
        return &self.induced_failure;
    }

    pub fn is_declared(&self, queue: &str) -> bool {
        return self.queues.contains_key(queue);
    }

    pub fn queue_count(&self) -> usize {
        return self.queues.len();
    }

    pub fn exclusive_queue_count(&self) -> usize {
        return self.queues.iter().filter(|queue| queue.value().exclusive).count();
    }

    pub fn unacked_count(&self) -> usize {
        return self.unacked.entries.len();
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.induced_failure.is_disconnected() {
            return Err(TransportError::Disconnected(format!("virtual host {}", self.virtual_host)));
        }
        return Ok(());
    }

    fn declare(&self, queue: &str, exclusive: bool) {
        self.queues.entry(queue.to_string()).or_insert_with(|| {
            let (sender, receiver) = mpsc::unbounded_channel();
            return Arc::new(InMemoryQueue {
                exclusive,
                sender,
                receiver: Mutex::new(Some(receiver)),
            });
        });
    }

    async fn forward(queue_name: String,
                     queue: Weak<InMemoryQueue>,
                     mut receiver: UnboundedReceiver<Message>,
                     deliveries: UnboundedSender<Delivery>,
                     ack_mode: AckMode,
                     consumer_tag: ConsumerTag,
                     unacked: Arc<UnackedLedger>) {
        let mut undelivered = None;
        loop {
            let message = tokio::select! {
                biased;
                _ = deliveries.closed() => break,
                message = receiver.recv() => message,
            };
            let message = match message {
                None => break,
                Some(message) => message,
            };

            let delivery_tag = unacked.next_delivery_tag();
            if ack_mode == AckMode::Manual {
                unacked.entries.insert(delivery_tag, UnackedDelivery {
                    consumer_tag,
                    queue: queue_name.clone(),
                    message: message.clone(),
                });
            }
            if let Err(SendError(delivery)) = deliveries.send(Delivery { delivery_tag, message }) {
                unacked.entries.remove(&delivery_tag);
                undelivered = Some(delivery.message);
                break;
            }
        }

        let requeued: Vec<Message> = unacked.release(consumer_tag).into_iter().chain(undelivered).collect();
        let queue = match queue.upgrade() {
            None => {
                debug!(queue = %queue_name, dropped = requeued.len(), "queue deleted, dropping unacknowledged deliveries");
                return;
            }
            Some(queue) => queue,
        };
        if !requeued.is_empty() {
            debug!(queue = %queue_name, requeued = requeued.len(), "consumer went away, requeueing deliveries");
        }
        for message in requeued {
            let _ = queue.sender.send(message);
        }
        *queue.receiver.lock().await = Some(receiver);
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        return InMemoryBroker::new();
    }
}

#[async_trait]
impl BrokerTransport for InMemoryBroker {
    async fn declare_durable_queue(&self, queue: &str) -> Result<(), TransportError> {
        self.ensure_connected()?;
        self.declare(queue, false);
        return Ok(());
    }

    async fn declare_exclusive_queue(&self) -> Result<String, TransportError> {
        self.ensure_connected()?;
        let queue = format!("{}{}", EXCLUSIVE_QUEUE_PREFIX, Uuid::new_v4().simple());
        self.declare(&queue, true);
        return Ok(queue);
    }

    async fn delete_queue(&self, queue: &str) -> Result<(), TransportError> {
        self.ensure_connected()?;
        return match self.queues.remove(queue) {
            None => Err(TransportError::QueueNotFound(queue.to_string())),
            Some(_) => {
                self.unacked.entries.retain(|_, unacked| unacked.queue.as_str() != queue);
                Ok(())
            }
        };
    }

    async fn publish(&self, queue: &str, message: Message) -> Result<(), TransportError> {
        self.ensure_connected()?;
        if self.induced_failure.should_fail_publish_to(queue) {
            return Err(TransportError::PublishFailed {
                queue: queue.to_string(),
                reason: "induced failure".to_string(),
            });
        }
        self.induced_failure.increase_publish_count_for(queue);

        match self.queues.get(queue) {
            None => debug!(queue = %queue, "no such queue, message dropped"),
            Some(target) => {
                if target.value().sender.send(message).is_err() {
                    debug!(queue = %queue, "queue closed, message dropped");
                }
            }
        }
        return Ok(());
    }

    async fn consume(&self, queue: &str, ack_mode: AckMode) -> Result<Consumer, TransportError> {
        self.ensure_connected()?;
        let target = match self.queues.get(queue) {
            None => return Err(TransportError::QueueNotFound(queue.to_string())),
            Some(target) => target.value().clone(),
        };

        let receiver = match target.receiver.lock().await.take() {
            None => return Err(TransportError::ConsumerAlreadyActive(queue.to_string())),
            Some(receiver) => receiver,
        };

        let (deliveries, consumer_deliveries) = mpsc::unbounded_channel();
        tokio::spawn(Self::forward(
            queue.to_string(),
            Arc::downgrade(&target),
            receiver,
            deliveries,
            ack_mode,
            self.unacked.next_consumer_tag(),
            self.unacked.clone(),
        ));
        return Ok(Consumer::new(queue, consumer_deliveries));
    }

    async fn ack(&self, delivery_tag: DeliveryTag) -> Result<(), TransportError> {
        self.ensure_connected()?;
        return match self.unacked.entries.remove(&delivery_tag) {
            None => Err(TransportError::UnknownDeliveryTag(delivery_tag)),
            Some(_) => Ok(()),
        };
    }
}
