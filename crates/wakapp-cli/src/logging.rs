//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wakapp_core::storage::LoggingConfig;

/// Install the global subscriber, writing to stderr so command output on
/// stdout stays machine-readable.
///
/// `RUST_LOG` wins over the configured filter. `force_json` comes from the
/// command line and overrides `logging.json`.
pub fn init(config: &LoggingConfig, force_json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if force_json || config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
