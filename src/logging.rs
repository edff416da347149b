//! Logging and tracing setup.
//!
//! The library only emits `tracing` events; hosts that want them on stderr
//! call one of the initialisers below once at startup.

use std::sync::Once;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber with human-readable output.
///
/// Subsequent calls (of either initialiser) are ignored.
pub fn init_tracing() {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);

        // try_init: a host may already own the global subscriber
        let _ = tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt_layer)
            .try_init();

        info!("vita-coredump tracing initialized");
    });
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json() {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_current_span(true)
            .with_writer(std::io::stderr);

        let _ = tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt_layer)
            .try_init();

        info!("vita-coredump tracing initialized (JSON mode)");
    });
}
