use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tracing::debug;

pub struct InducedFailure {
    disconnected: AtomicBool,
    fail_publishes_to: DashMap<String, bool>,
    fail_publishes_after: DashMap<String, u64>,
    publish_count_by_queue: DashMap<String, u64>,
}

impl InducedFailure {
    pub fn new() -> Self {
        return InducedFailure {
            disconnected: AtomicBool::new(false),
            fail_publishes_to: DashMap::new(),
            fail_publishes_after: DashMap::new(),
            publish_count_by_queue: DashMap::new(),
        };
    }

    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    pub fn reconnect(&self) {
        self.disconnected.store(false, Ordering::SeqCst);
    }

    pub fn is_disconnected(&self) -> bool {
        return self.disconnected.load(Ordering::SeqCst);
    }

    pub fn fail_publishes_to(&self, queue: &str) {
        self.fail_publishes_to.insert(queue.to_string(), true);
    }

    pub fn fail_publishes_after(&self, count: u64, queue: &str) {
        self.fail_publishes_to.remove(queue);
        self.publish_count_by_queue.remove(queue);
        self.fail_publishes_after.insert(queue.to_string(), count);
    }

    pub fn clear(&self) {
        self.reconnect();
        self.fail_publishes_to.clear();
        self.fail_publishes_after.clear();
        self.publish_count_by_queue.clear();
    }

    pub(crate) fn should_fail_publish_to(&self, queue: &str) -> bool {
        if self.fail_publishes_to.contains_key(queue) {
            debug!(queue = %queue, "failing publish");
            return true;
        }
        if let Some(entry) = self.fail_publishes_after.get(queue) {
            let publish_count: u64 = match self.publish_count_by_queue.get(queue) {
                None => 0,
                Some(count_by_queue) => *count_by_queue.value(),
            };
            return publish_count >= *entry.value();
        }
        return false;
    }

    pub(crate) fn increase_publish_count_for(&self, queue: &str) {
        let mut count = self.publish_count_by_queue.entry(queue.to_string()).or_insert(0);
        *count.value_mut() += 1;
    }
}

impl Default for InducedFailure {
    fn default() -> Self {
        return InducedFailure::new();
    }
}
