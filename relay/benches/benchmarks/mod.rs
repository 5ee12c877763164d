pub mod correlation_registry;
