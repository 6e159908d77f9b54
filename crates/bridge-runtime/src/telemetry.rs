//! Tracing setup for embedding processes.

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable selecting the log filter.
pub const LOG_FILTER_ENV: &str = "LOGBRIDGE_LOG";

/// Install the global tracing subscriber.
///
/// The filter comes from `LOGBRIDGE_LOG` and defaults to `info`. Calling
/// this twice is a no-op; tests that install their own subscriber keep it.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
