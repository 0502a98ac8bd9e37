//! Tracing setup for the binary.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Env var holding the log filter (e.g. `debug`, `jqline=trace`).
pub const LOG_ENV: &str = "JQLINE_LOG";

/// Initialize tracing on stderr. Stdout is reserved for results.
///
/// Defaults to `warn` when `JQLINE_LOG` is unset or invalid.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    // A subscriber may already be set (tests, embedding hosts).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}
