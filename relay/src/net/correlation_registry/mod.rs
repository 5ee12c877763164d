pub mod correlation_registry;
pub mod correlation_registry_config;
pub mod pending_waiter;
pub mod registry_error;
mod expired_waiter_remover;
