pub mod consumer;
pub mod in_memory_broker;
pub mod induced_failure;
pub mod message;
pub mod transport;
pub mod transport_error;
