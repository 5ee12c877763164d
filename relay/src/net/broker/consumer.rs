use tokio::sync::mpsc::UnboundedReceiver;

use crate::net::broker::message::Delivery;

pub struct Consumer {
    queue: String,
    deliveries: UnboundedReceiver<Delivery>,
}

impl Consumer {
    pub fn new(queue: impl Into<String>, deliveries: UnboundedReceiver<Delivery>) -> Self {
        return Consumer { queue: queue.into(), deliveries };
    }

    pub fn get_queue(&self) -> &str {
        return &self.queue;
    }

    /// `None` once the queue is deleted or the transport goes away.
    pub async fn next_delivery(&mut self) -> Option<Delivery> {
        return self.deliveries.recv().await;
    }
}
