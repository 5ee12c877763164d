pub mod broker;
pub mod correlation;
pub mod correlation_registry;
pub mod rpc;
