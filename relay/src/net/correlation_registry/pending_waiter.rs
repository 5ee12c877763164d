use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::SystemTime;

use tokio::sync::oneshot;

use crate::clock::clock::Clock;
use crate::net::correlation::correlation_token::CorrelationToken;

#[derive(Debug, Eq, PartialEq)]
pub enum WaiterOutcome<Response> {
    Resolved(Response),
    Expired,
    Cancelled,
}

/// Registry-owned half of an outstanding request. The resolve slot is
/// single-assignment: once any outcome is delivered the slot is gone.
pub struct PendingWaiter<Response> {
    token: CorrelationToken,
    created_at: SystemTime,
    deadline: Option<SystemTime>,
    resolve_slot: Option<oneshot::Sender<WaiterOutcome<Response>>>,
}

/// Caller-owned half of an outstanding request.
pub struct PendingResponse<Response> {
    token: CorrelationToken,
    receiver: oneshot::Receiver<WaiterOutcome<Response>>,
}

impl<Response> PendingWaiter<Response> {
    pub(crate) fn new(token: CorrelationToken,
                      created_at: SystemTime,
                      deadline: Option<SystemTime>) -> (PendingWaiter<Response>, PendingResponse<Response>) {
        let (sender, receiver) = oneshot::channel();
        let waiter = PendingWaiter {
            token: token.clone(),
            created_at,
            deadline,
            resolve_slot: Some(sender),
        };
        return (waiter, PendingResponse { token, receiver });
    }

    pub fn get_token(&self) -> &CorrelationToken {
        return &self.token;
    }

    pub fn get_created_at(&self) -> SystemTime {
        return self.created_at;
    }

    pub fn get_deadline(&self) -> Option<SystemTime> {
        return self.deadline;
    }

    pub fn is_settled(&self) -> bool {
        return self.resolve_slot.is_none();
    }

    pub(crate) fn has_expired(&self, clock: &Arc<dyn Clock>) -> bool {
        return match self.deadline {
            None => false,
            Some(deadline) => clock.has_passed(deadline),
        };
    }

    pub(crate) fn on_response(&mut self, response: Response) {
        self.settle(WaiterOutcome::Resolved(response));
    }

    pub(crate) fn on_timeout(&mut self) {
        self.settle(WaiterOutcome::Expired);
    }

    pub(crate) fn on_cancel(&mut self) {
        self.settle(WaiterOutcome::Cancelled);
    }

    fn settle(&mut self, outcome: WaiterOutcome<Response>) {
        if let Some(resolve_slot) = self.resolve_slot.take() {
            // the caller may have stopped waiting, nobody left to tell
            let _ = resolve_slot.send(outcome);
        }
    }
}

impl<Response> PendingResponse<Response> {
    pub fn get_token(&self) -> &CorrelationToken {
        return &self.token;
    }
}

impl<Response> Future for PendingResponse<Response> {
    type Output = WaiterOutcome<Response>;

    fn poll(self: Pin<&mut Self>, ctx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        return Pin::new(&mut this.receiver)
            .poll(ctx)
            .map(|result| result.unwrap_or(WaiterOutcome::Cancelled));
    }
}
