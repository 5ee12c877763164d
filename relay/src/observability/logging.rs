use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global `tracing` subscriber. `RUST_LOG` wins over
/// `default_filter` when it is set. Returns false if a subscriber was already
/// installed, which happens when several tests in one binary initialize logging.
pub fn init_logging(default_filter: &str) -> bool {
    return tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();
}
