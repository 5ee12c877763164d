use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use opentelemetry::trace::{SpanKind, Status};
use opentelemetry::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument, warn};

use crate::clock::clock::{Clock, SystemClock};
use crate::net::broker::message::{Message, MessageProperties};
use crate::net::broker::transport::BrokerTransport;
use crate::net::broker::transport_error::TransportError;
use crate::net::correlation::correlation_token::{CorrelationToken, CorrelationTokenGenerator};
use crate::net::correlation::random_correlation_token_generator::RandomCorrelationTokenGenerator;
use crate::net::correlation_registry::correlation_registry::CorrelationRegistry;
use crate::net::correlation_registry::correlation_registry_config::CorrelationRegistryConfig;
use crate::net::correlation_registry::pending_waiter::WaiterOutcome;
use crate::net::rpc::{
    MESSAGING_DESTINATION_ATTRIBUTE,
    MESSAGING_SYSTEM,
    MESSAGING_SYSTEM_ATTRIBUTE,
    RPC_CORRELATION_ID_ATTRIBUTE,
    SEND_RPC_REQUEST_SPAN,
};
use crate::net::rpc::reply_destination::ReplyDestination;
use crate::net::rpc::rpc_error::RpcError;
use crate::net::rpc::rpc_reply::RpcReply;
use crate::trace::propagation;
use crate::trace::tracer::Tracer;

/// Issues requests over a shared broker transport and waits for the correlated
/// response.
///
/// Each call gets its own exclusive reply queue which is released once the
/// call completes, times out, fails or is cancelled. Every call carries a
/// deadline; the correlation registry settles it exactly once.
pub struct RpcClient {
    transport: Arc<dyn BrokerTransport>,
    tracer: Tracer,
    registry: Arc<CorrelationRegistry<RpcReply>>,
    registry_config: CorrelationRegistryConfig,
    token_generator: Arc<dyn CorrelationTokenGenerator>,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn BrokerTransport>, tracer: Tracer, registry_config: CorrelationRegistryConfig) -> Self {
        return RpcClient {
            transport,
            tracer,
            registry: Arc::new(CorrelationRegistry::new(Arc::new(SystemClock::new()), registry_config)),
            registry_config,
            token_generator: Arc::new(RandomCorrelationTokenGenerator::new()),
        };
    }

    pub fn with_token_generator(mut self, token_generator: Arc<dyn CorrelationTokenGenerator>) -> Self {
        self.token_generator = token_generator;
        return self;
    }

    /// Replaces the clock used for deadlines. Must be called before the first
    /// call is issued, as it starts from an empty registry.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.registry = Arc::new(CorrelationRegistry::new(clock, self.registry_config));
        return self;
    }

    pub async fn call(&self, queue: &str, payload: impl Into<Bytes>, timeout: Duration) -> Result<Bytes, RpcError> {
        return self.call_with_cancellation(None, queue, payload, timeout, &CancellationToken::new()).await;
    }

    pub async fn call_with_parent(&self,
                                  parent: &Context,
                                  queue: &str,
                                  payload: impl Into<Bytes>,
                                  timeout: Duration) -> Result<Bytes, RpcError> {
        return self.call_with_cancellation(Some(parent), queue, payload, timeout, &CancellationToken::new()).await;
    }

    pub async fn call_with_cancellation(&self,
                                        parent: Option<&Context>,
                                        queue: &str,
                                        payload: impl Into<Bytes>,
                                        timeout: Duration,
                                        cancellation: &CancellationToken) -> Result<Bytes, RpcError> {
        let token = self.token_generator.generate();
        if timeout.is_zero() {
            return Err(RpcError::Timeout { token, after: timeout });
        }

        let span = self.tracer.start_span(SEND_RPC_REQUEST_SPAN, SpanKind::Client, parent);
        span.set_attribute(MESSAGING_SYSTEM_ATTRIBUTE, MESSAGING_SYSTEM);
        span.set_attribute(MESSAGING_DESTINATION_ATTRIBUTE, queue.to_string());
        span.set_attribute(RPC_CORRELATION_ID_ATTRIBUTE, token.to_string());

        let request = Request { token: &token, queue, payload: payload.into(), timeout, context: span.context() };
        let result = self.exchange(request, cancellation).instrument(span.log_span()).await;
        match &result {
            Ok(_) => span.set_status(Status::Ok),
            Err(err) => span.record_fault(err),
        }
        span.end();
        return result;
    }

    pub fn pending_calls(&self) -> usize {
        return self.registry.pending_count();
    }

    async fn exchange(&self, request: Request<'_>, cancellation: &CancellationToken) -> Result<Bytes, RpcError> {
        let mut reply_destination = ReplyDestination::provision(self.transport.clone()).await?;
        let result = self.await_reply(&mut reply_destination, request, cancellation).await;
        reply_destination.release().await;
        return result;
    }

    async fn await_reply(&self,
                         reply_destination: &mut ReplyDestination,
                         request: Request<'_>,
                         cancellation: &CancellationToken) -> Result<Bytes, RpcError> {
        let token = request.token;
        let mut response = self.registry.register_with_deadline(token.clone(), request.timeout)?;

        if let Err(err) = self.send(reply_destination, &request).await {
            warn!(correlation_token = %token, queue = %request.queue, error = %err, "could not send request");
            self.registry.cancel(token);
            return Err(err.into());
        }

        let outcome = tokio::select! {
            outcome = &mut response => outcome,
            _ = tokio::time::sleep(request.timeout) => {
                if self.registry.time_out(token) { WaiterOutcome::Expired } else { response.await }
            }
            _ = cancellation.cancelled() => {
                if self.registry.cancel(token) { WaiterOutcome::Cancelled } else { response.await }
            }
        };

        return match outcome {
            WaiterOutcome::Resolved(reply) => {
                debug!(correlation_token = %token, "received reply");
                reply.into_result(token.clone())
            }
            WaiterOutcome::Expired => {
                warn!(correlation_token = %token, queue = %request.queue, timeout = ?request.timeout, "call timed out");
                Err(RpcError::Timeout { token: token.clone(), after: request.timeout })
            }
            WaiterOutcome::Cancelled => {
                debug!(correlation_token = %token, "call cancelled");
                Err(RpcError::Cancelled { token: token.clone() })
            }
        };
    }

    async fn send(&self, reply_destination: &mut ReplyDestination, request: &Request<'_>) -> Result<(), TransportError> {
        reply_destination.listen(self.registry.clone()).await?;

        let properties = MessageProperties::default()
            .with_correlation_id(request.token.as_str())
            .with_reply_to(reply_destination.get_queue())
            .with_headers(propagation::inject(request.context));

        self.transport.publish(request.queue, Message::with_properties(request.payload.clone(), properties)).await?;
        debug!(correlation_token = %request.token, queue = %request.queue, reply_to = %reply_destination.get_queue(), "published request");
        return Ok(());
    }
}

struct Request<'a> {
    token: &'a CorrelationToken,
    queue: &'a str,
    payload: Bytes,
    timeout: Duration,
    context: &'a Context,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use opentelemetry::trace::{SpanKind, Status, TraceContextExt};
    use opentelemetry_sdk::trace::InMemorySpanExporter;
    use tokio_util::sync::CancellationToken;

    use crate::net::broker::in_memory_broker::InMemoryBroker;
    use crate::net::broker::message::{AckMode, Message, MessageProperties};
    use crate::net::broker::transport::BrokerTransport;
    use crate::net::broker::transport_error::TransportError;
    use crate::net::correlation::correlation_token::CorrelationToken;
    use crate::net::correlation_registry::correlation_registry_config::CorrelationRegistryConfig;
    use crate::net::rpc::rpc_client::RpcClient;
    use crate::net::rpc::rpc_client::tests::setup::{attribute, FixedCorrelationTokenGenerator, reply_to_one_request, spans_named, tracer_with_exporter};
    use crate::net::rpc::rpc_error::RpcError;
    use crate::net::rpc::SEND_RPC_REQUEST_SPAN;
    use crate::trace::propagation;

    mod setup {
        use std::sync::Arc;

        use opentelemetry_sdk::trace::{InMemorySpanExporter, InMemorySpanExporterBuilder, SdkTracerProvider, SpanData};

        use crate::net::broker::in_memory_broker::InMemoryBroker;
        use crate::net::broker::message::{AckMode, Message, MessageProperties};
        use crate::net::broker::transport::BrokerTransport;
        use crate::net::correlation::correlation_token::{CorrelationToken, CorrelationTokenGenerator};
        use crate::trace::tracer::Tracer;

        pub(crate) struct FixedCorrelationTokenGenerator {
            pub(crate) token: &'static str,
        }

        impl CorrelationTokenGenerator for FixedCorrelationTokenGenerator {
            fn generate(&self) -> CorrelationToken {
                return CorrelationToken::from(self.token);
            }
        }

        pub(crate) async fn reply_to_one_request(broker: Arc<InMemoryBroker>, queue: &'static str, reply: &'static str) {
            broker.declare_durable_queue(queue).await.unwrap();
            let mut consumer = broker.consume(queue, AckMode::Auto).await.unwrap();
            tokio::spawn(async move {
                let delivery = consumer.next_delivery().await.unwrap();
                let properties = MessageProperties::default()
                    .with_correlation_id(delivery.message.properties.correlation_id.clone().unwrap());
                let reply_to = delivery.message.properties.reply_to.clone().unwrap();
                broker.publish(&reply_to, Message::with_properties(reply, properties)).await.unwrap();
            });
        }

        pub(crate) fn tracer_with_exporter() -> (Tracer, InMemorySpanExporter) {
            let exporter = InMemorySpanExporterBuilder::new().build();
            let provider = SdkTracerProvider::builder().with_simple_exporter(exporter.clone()).build();
            return (Tracer::new(&provider), exporter);
        }

        pub(crate) fn spans_named(exporter: &InMemorySpanExporter, name: &str) -> Vec<SpanData> {
            return exporter.get_finished_spans().unwrap().into_iter().filter(|span| span.name == name).collect();
        }

        pub(crate) fn attribute(span: &SpanData, key: &str) -> Option<String> {
            return span.attributes.iter()
                .find(|attribute| attribute.key.as_str() == key)
                .map(|attribute| attribute.value.as_str().to_string());
        }
    }

    fn client_over(broker: Arc<InMemoryBroker>) -> (RpcClient, InMemorySpanExporter) {
        let (tracer, exporter) = tracer_with_exporter();
        return (RpcClient::new(broker, tracer, CorrelationRegistryConfig::default()), exporter);
    }

    #[tokio::test]
    async fn call_and_receive_reply() {
        let broker = Arc::new(InMemoryBroker::new());
        reply_to_one_request(broker.clone(), "test-1", "pong").await;

        let (client, exporter) = client_over(broker.clone());
        let reply = client.call("test-1", "ping", Duration::from_secs(5)).await;

        assert_eq!(Ok(Bytes::from("pong")), reply);
        assert_eq!(0, client.pending_calls());
        assert_eq!(0, broker.exclusive_queue_count());

        let spans = spans_named(&exporter, SEND_RPC_REQUEST_SPAN);
        assert_eq!(1, spans.len());
        assert_eq!(SpanKind::Client, spans[0].span_kind);
        assert_eq!(Status::Ok, spans[0].status);
        assert_eq!(Some("test-1".to_string()), attribute(&spans[0], "messaging.destination"));
    }

    #[tokio::test]
    async fn request_carries_token_reply_queue_and_trace_headers() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.declare_durable_queue("test-1").await.unwrap();
        let mut consumer = broker.consume("test-1", AckMode::Auto).await.unwrap();

        let (tracer, _exporter) = tracer_with_exporter();
        let client = RpcClient::new(broker.clone(), tracer.clone(), CorrelationRegistryConfig::default())
            .with_token_generator(Arc::new(FixedCorrelationTokenGenerator { token: "token-1" }));
        let parent = tracer.start_root_span("employees-page", SpanKind::Server);

        let call = client.call_with_parent(parent.context(), "test-1", "ping", Duration::from_millis(100));
        let inspect = async {
            let delivery = consumer.next_delivery().await.unwrap();
            let properties = delivery.message.properties;
            let context = propagation::try_extract(&properties.headers).unwrap();
            let span = context.span();

            assert_eq!(Some("token-1".to_string()), properties.correlation_id);
            assert!(properties.reply_to.unwrap().starts_with("amq.gen-"));
            assert_eq!(parent.span_context().trace_id(), span.span_context().trace_id());
            assert_ne!(parent.span_context().span_id(), span.span_context().span_id());
        };
        let (result, _) = tokio::join!(call, inspect);

        assert!(matches!(result, Err(RpcError::Timeout { .. })));
    }

    #[tokio::test]
    async fn time_out_without_reply() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.declare_durable_queue("test-1").await.unwrap();

        let (client, exporter) = client_over(broker.clone());
        let client = client.with_token_generator(Arc::new(FixedCorrelationTokenGenerator { token: "token-1" }));
        let reply = client.call("test-1", "ping", Duration::from_millis(30)).await;

        assert_eq!(
            Err(RpcError::Timeout { token: CorrelationToken::from("token-1"), after: Duration::from_millis(30) }),
            reply
        );
        assert_eq!(0, client.pending_calls());
        assert_eq!(0, broker.exclusive_queue_count());
        assert!(matches!(exporter.get_finished_spans().unwrap()[0].status, Status::Error { .. }));
    }

    #[tokio::test]
    async fn reject_zero_timeout_without_touching_the_broker() {
        let broker = Arc::new(InMemoryBroker::new());
        let (client, _exporter) = client_over(broker.clone());

        let reply = client.call("test-1", "ping", Duration::ZERO).await;

        assert!(matches!(reply, Err(RpcError::Timeout { .. })));
        assert_eq!(0, broker.queue_count());
    }

    #[tokio::test]
    async fn cancel_an_outstanding_call() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.declare_durable_queue("test-1").await.unwrap();
        let (client, _exporter) = client_over(broker.clone());
        let cancellation = CancellationToken::new();

        let call = client.call_with_cancellation(None, "test-1", "ping", Duration::from_secs(5), &cancellation);
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancellation.cancel();
        };
        let (reply, _) = tokio::join!(call, cancel);

        assert!(matches!(reply, Err(RpcError::Cancelled { .. })));
        assert_eq!(0, client.pending_calls());
        assert_eq!(0, broker.exclusive_queue_count());
    }

    #[tokio::test]
    async fn publish_failure_releases_everything() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.declare_durable_queue("test-1").await.unwrap();
        broker.get_induced_failure().fail_publishes_to("test-1");
        let (client, _exporter) = client_over(broker.clone());

        let reply = client.call("test-1", "ping", Duration::from_secs(5)).await;

        assert!(matches!(reply, Err(RpcError::Transport(TransportError::PublishFailed { .. }))));
        assert_eq!(0, client.pending_calls());
        assert_eq!(0, broker.exclusive_queue_count());
    }

    #[tokio::test]
    async fn disconnected_broker_fails_immediately() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.get_induced_failure().disconnect();
        let (client, _exporter) = client_over(broker.clone());

        let reply = client.call("test-1", "ping", Duration::from_secs(5)).await;

        assert!(matches!(reply, Err(RpcError::Transport(TransportError::Disconnected(_)))));
        assert_eq!(0, client.pending_calls());
    }

    #[tokio::test]
    async fn error_status_reply_becomes_handler_fault() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.declare_durable_queue("test-1").await.unwrap();
        let mut consumer = broker.consume("test-1", AckMode::Auto).await.unwrap();
        let replier = broker.clone();
        tokio::spawn(async move {
            let delivery = consumer.next_delivery().await.unwrap();
            let properties = MessageProperties::default()
                .with_correlation_id(delivery.message.properties.correlation_id.clone().unwrap())
                .with_header("x-rpc-status", "error");
            let reply_to = delivery.message.properties.reply_to.clone().unwrap();
            replier.publish(&reply_to, Message::with_properties("no employees", properties)).await.unwrap();
        });

        let (client, _exporter) = client_over(broker.clone());
        let reply = client.call("test-1", "ping", Duration::from_secs(5)).await;

        assert!(matches!(reply, Err(RpcError::HandlerFault { ref message, .. }) if message == "no employees"));
    }

    #[tokio::test]
    async fn duplicate_token_is_rejected() {
        let broker = Arc::new(InMemoryBroker::new());
        broker.declare_durable_queue("test-1").await.unwrap();
        let (client, _exporter) = client_over(broker.clone());
        let client = client.with_token_generator(Arc::new(FixedCorrelationTokenGenerator { token: "token-1" }));

        let first = client.call("test-1", "ping", Duration::from_millis(100));
        let second = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            return client.call("test-1", "ping", Duration::from_millis(100)).await;
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, Err(RpcError::Timeout { .. })));
        assert_eq!(Err(RpcError::DuplicateToken(CorrelationToken::from("token-1"))), second);
        assert_eq!(0, broker.exclusive_queue_count());
    }
}
