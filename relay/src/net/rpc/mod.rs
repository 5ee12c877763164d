pub mod fault_policy;
pub mod request_handler;
pub mod rpc_client;
pub mod rpc_error;
pub mod rpc_reply;
pub mod rpc_worker;
pub mod worker_shutdown_handle;

mod reply_destination;

pub const SEND_RPC_REQUEST_SPAN: &str = "send-rpc-request";
pub const PROCESS_RPC_REQUEST_SPAN: &str = "process-rpc-request";

pub const MESSAGING_SYSTEM_ATTRIBUTE: &str = "messaging.system";
pub const MESSAGING_DESTINATION_ATTRIBUTE: &str = "messaging.destination";
pub const RPC_CORRELATION_ID_ATTRIBUTE: &str = "rpc.correlation_id";

pub const MESSAGING_SYSTEM: &str = "rabbitmq";
