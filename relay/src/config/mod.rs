pub mod broker_url;
pub mod config_error;
pub mod relay_config;
