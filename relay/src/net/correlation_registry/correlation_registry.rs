use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::clock::clock::Clock;
use crate::net::correlation::correlation_token::CorrelationToken;
use crate::net::correlation_registry::correlation_registry_config::CorrelationRegistryConfig;
use crate::net::correlation_registry::expired_waiter_remover::ExpiredWaiterRemover;
use crate::net::correlation_registry::pending_waiter::{PendingResponse, PendingWaiter};
use crate::net::correlation_registry::registry_error::RegistryError;

pub(crate) type PendingWaiters<Response> = DashMap<CorrelationToken, PendingWaiter<Response>>;

/// Table of outstanding requests keyed by correlation token.
///
/// Every settling operation removes the entry from the map before signalling
/// the waiter, and only the caller that performed the removal signals it. A
/// response racing a timeout therefore produces exactly one outcome: the loser
/// finds no entry and reports a no-op.
pub struct CorrelationRegistry<Response: Send + 'static> {
    pending_waiters: Arc<PendingWaiters<Response>>,
    clock: Arc<dyn Clock>,
}

impl<Response: Send + 'static> CorrelationRegistry<Response> {
    pub fn new(clock: Arc<dyn Clock>, config: CorrelationRegistryConfig) -> Self {
        return Self::new_with_capacity(0, clock, config);
    }

    pub fn new_with_capacity(capacity: usize,
                             clock: Arc<dyn Clock>,
                             config: CorrelationRegistryConfig) -> Self {
        let registry = Self::new_with_capacity_and_disabled_expired_waiters_removal(capacity, clock);
        ExpiredWaiterRemover::start(
            Arc::downgrade(&registry.pending_waiters),
            registry.clock.clone(),
            config,
        );
        return registry;
    }

    pub fn new_with_disabled_expired_waiters_removal(clock: Arc<dyn Clock>) -> Self {
        return Self::new_with_capacity_and_disabled_expired_waiters_removal(0, clock);
    }

    pub fn new_with_capacity_and_disabled_expired_waiters_removal(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        return CorrelationRegistry {
            pending_waiters: Arc::new(DashMap::with_capacity(capacity)),
            clock,
        };
    }

    pub fn register(&self, token: CorrelationToken) -> Result<PendingResponse<Response>, RegistryError> {
        return self.register_waiter(token, None);
    }

    pub fn register_with_deadline(&self, token: CorrelationToken, expire_after: Duration) -> Result<PendingResponse<Response>, RegistryError> {
        return self.register_waiter(token, Some(expire_after));
    }

    pub fn resolve(&self, token: &CorrelationToken, response: Response) -> bool {
        return match self.pending_waiters.remove(token) {
            None => false,
            Some((_, mut waiter)) => {
                waiter.on_response(response);
                true
            }
        };
    }

    /// Removes the waiter only if its deadline has elapsed, signalling expiry to
    /// whoever awaits it. The returned waiter is already settled.
    pub fn expire(&self, token: &CorrelationToken) -> Option<PendingWaiter<Response>> {
        return Self::expire_in(&self.pending_waiters, &self.clock, token);
    }

    /// Expires the waiter regardless of its deadline; used by callers that run
    /// their own timer.
    pub fn time_out(&self, token: &CorrelationToken) -> bool {
        return match self.pending_waiters.remove(token) {
            None => false,
            Some((_, mut waiter)) => {
                waiter.on_timeout();
                true
            }
        };
    }

    pub fn cancel(&self, token: &CorrelationToken) -> bool {
        return match self.pending_waiters.remove(token) {
            None => false,
            Some((_, mut waiter)) => {
                waiter.on_cancel();
                true
            }
        };
    }

    pub fn is_pending(&self, token: &CorrelationToken) -> bool {
        return self.pending_waiters.contains_key(token);
    }

    pub fn pending_count(&self) -> usize {
        return self.pending_waiters.len();
    }

    pub(crate) fn expire_in(pending_waiters: &PendingWaiters<Response>,
                            clock: &Arc<dyn Clock>,
                            token: &CorrelationToken) -> Option<PendingWaiter<Response>> {
        let removed = pending_waiters.remove_if(token, |_, waiter| waiter.has_expired(clock));
        return removed.map(|(_, mut waiter)| {
            waiter.on_timeout();
            waiter
        });
    }

    fn register_waiter(&self, token: CorrelationToken, expire_after: Option<Duration>) -> Result<PendingResponse<Response>, RegistryError> {
        let created_at = self.clock.now();
        let deadline = expire_after.map(|expire_after| created_at + expire_after);

        return match self.pending_waiters.entry(token.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateToken(token)),
            Entry::Vacant(vacant) => {
                let (waiter, response) = PendingWaiter::new(token, created_at, deadline);
                vacant.insert(waiter);
                Ok(response)
            }
        };
    }
}
