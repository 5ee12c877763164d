use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use opentelemetry::trace::{SpanKind, Status};
use tokio::sync::mpsc;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info, Instrument, warn};

use crate::net::broker::consumer::Consumer;
use crate::net::broker::message::{AckMode, Delivery, Message};
use crate::net::broker::transport::BrokerTransport;
use crate::net::broker::transport_error::TransportError;
use crate::net::rpc::{
    MESSAGING_DESTINATION_ATTRIBUTE,
    MESSAGING_SYSTEM,
    MESSAGING_SYSTEM_ATTRIBUTE,
    PROCESS_RPC_REQUEST_SPAN,
    RPC_CORRELATION_ID_ATTRIBUTE,
};
use crate::net::rpc::fault_policy::FaultPolicy;
use crate::net::rpc::request_handler::{HandlerFault, RequestHandler};
use crate::net::rpc::rpc_reply::RpcReply;
use crate::net::rpc::worker_shutdown_handle::WorkerShutdownHandle;
use crate::trace::propagation;
use crate::trace::span::SpanScope;
use crate::trace::tracer::Tracer;

/// Serves requests from a durable queue. Every delivery is processed on its
/// own task, so a slow or failing handler never holds up the others.
pub struct RpcWorker {
    transport: Arc<dyn BrokerTransport>,
    request_queue: String,
    handler: Arc<dyn RequestHandler>,
    tracer: Tracer,
    fault_policy: FaultPolicy,
}

impl RpcWorker {
    pub fn new(transport: Arc<dyn BrokerTransport>,
               request_queue: impl Into<String>,
               handler: Arc<dyn RequestHandler>,
               tracer: Tracer) -> Self {
        return RpcWorker {
            transport,
            request_queue: request_queue.into(),
            handler,
            tracer,
            fault_policy: FaultPolicy::default(),
        };
    }

    pub fn with_fault_policy(mut self, fault_policy: FaultPolicy) -> Self {
        self.fault_policy = fault_policy;
        return self;
    }

    pub async fn start(self) -> Result<WorkerShutdownHandle, TransportError> {
        self.transport.declare_durable_queue(&self.request_queue).await?;
        let consumer = self.transport.consume(&self.request_queue, AckMode::Manual).await?;
        info!(queue = %self.request_queue, fault_policy = ?self.fault_policy, "worker started");

        let (shutdown_signal_sender, shutdown_signal_receiver) = mpsc::channel(1);
        let consumption_loop = tokio::spawn(Arc::new(self).consume(consumer, shutdown_signal_receiver));
        return Ok(WorkerShutdownHandle::new(shutdown_signal_sender, consumption_loop));
    }

    async fn consume(self: Arc<Self>, mut consumer: Consumer, mut shutdown_signal_receiver: Receiver<()>) {
        loop {
            tokio::select! {
                Some(_) = shutdown_signal_receiver.recv() => {
                    info!(queue = %self.request_queue, "worker stopping");
                    return;
                }
                delivery = consumer.next_delivery() => match delivery {
                    None => {
                        warn!(queue = %self.request_queue, "request queue closed, worker stopping");
                        return;
                    }
                    Some(delivery) => {
                        let worker = self.clone();
                        tokio::spawn(async move { worker.process(delivery).await });
                    }
                }
            }
        }
    }

    async fn process(&self, delivery: Delivery) {
        let Delivery { delivery_tag, message } = delivery;
        let parent = match propagation::try_extract(&message.properties.headers) {
            Ok(parent) => Some(parent),
            Err(err) => {
                debug!(queue = %self.request_queue, error = %err, "request carries no usable trace context, starting a new trace");
                None
            }
        };

        let span = self.tracer.start_span(PROCESS_RPC_REQUEST_SPAN, SpanKind::Server, parent.as_ref());
        span.set_attribute(MESSAGING_SYSTEM_ATTRIBUTE, MESSAGING_SYSTEM);
        span.set_attribute(MESSAGING_DESTINATION_ATTRIBUTE, self.request_queue.clone());

        let log_span = span.log_span();
        async {
            self.respond(message, &span).await;
            if let Err(err) = self.transport.ack(delivery_tag).await {
                error!(delivery_tag, error = %err, "could not acknowledge request");
            }
        }.instrument(log_span).await;

        span.end();
    }

    async fn respond(&self, message: Message, span: &SpanScope) {
        let (reply_to, correlation_id) = match (message.properties.reply_to, message.properties.correlation_id) {
            (Some(reply_to), Some(correlation_id)) => (reply_to, correlation_id),
            _ => {
                warn!(queue = %self.request_queue, "request without reply_to or correlation id, dropping it");
                span.set_status(Status::error("request has no reply route"));
                return;
            }
        };
        span.set_attribute(RPC_CORRELATION_ID_ATTRIBUTE, correlation_id.clone());

        let (reply, handled) = match self.handle(message.payload).await {
            Ok(payload) => (RpcReply::success(payload), true),
            Err(fault) => {
                warn!(correlation_token = %correlation_id, fault = %fault, "handler failed");
                span.record_fault(&fault);
                match self.fault_policy {
                    FaultPolicy::Silence => return,
                    FaultPolicy::ErrorResponse => (RpcReply::fault(fault.get_message()), false),
                }
            }
        };

        match self.transport.publish(&reply_to, reply.into_message(correlation_id.as_str())).await {
            Ok(_) => {
                if handled {
                    span.set_status(Status::Ok);
                }
                debug!(correlation_token = %correlation_id, reply_to = %reply_to, "replied");
            }
            Err(err) => {
                error!(correlation_token = %correlation_id, reply_to = %reply_to, error = %err, "could not publish reply");
                span.record_fault(&err);
            }
        }
    }

    // a panicking handler is answered like a failing one
    async fn handle(&self, payload: Bytes) -> Result<Bytes, HandlerFault> {
        return match AssertUnwindSafe(self.handler.handle(payload)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(HandlerFault::from_panic(panic)),
        };
    }
}
