//! Tracing initialization for conveyor binaries.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes the global tracing subscriber.
///
/// Uses the `RUST_LOG` environment variable for filtering, defaulting to the
/// `info` level when unset. Should be called once, before any pipeline tasks
/// are spawned, so startup logs are not lost.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
