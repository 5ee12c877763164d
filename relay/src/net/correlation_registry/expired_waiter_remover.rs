use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::clock::clock::Clock;
use crate::net::correlation::correlation_token::CorrelationToken;
use crate::net::correlation_registry::correlation_registry::{CorrelationRegistry, PendingWaiters};
use crate::net::correlation_registry::correlation_registry_config::CorrelationRegistryConfig;

pub(crate) struct ExpiredWaiterRemover<Response: Send + 'static> {
    pending_waiters: Weak<PendingWaiters<Response>>,
    clock: Arc<dyn Clock>,
}

impl<Response: Send + 'static> ExpiredWaiterRemover<Response> {
    pub(crate) fn start(pending_waiters: Weak<PendingWaiters<Response>>,
                        clock: Arc<dyn Clock>,
                        config: CorrelationRegistryConfig) {
        let remover = ExpiredWaiterRemover { pending_waiters, clock };
        let pause_expired_waiters_checker = config.get_pause_expired_waiters_checker();

        thread::spawn(move || {
            while remover.remove() {
                thread::sleep(pause_expired_waiters_checker);
            }
        });
    }

    // false once the registry is gone
    fn remove(&self) -> bool {
        let pending_waiters = match self.pending_waiters.upgrade() {
            None => return false,
            Some(pending_waiters) => pending_waiters,
        };

        let expired_tokens: Vec<CorrelationToken> = pending_waiters
            .iter()
            .filter(|entry| entry.value().has_expired(&self.clock))
            .map(|entry| entry.key().clone())
            .collect();

        for token in expired_tokens {
            if CorrelationRegistry::<Response>::expire_in(&pending_waiters, &self.clock, &token).is_some() {
                debug!(correlation_token = %token, "expired pending waiter");
            }
        }
        return true;
    }
}
