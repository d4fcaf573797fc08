//! Logging utilities for loadkit
//!
//! Re-exports tracing macros with log_* naming convention for consistency,
//! plus the console subscriber used as the operator-visible diagnostic sink.

use tracing_subscriber::EnvFilter;

// Re-export tracing macros with log_* naming
pub(crate) use tracing::{
    debug as log_debug,
    error as log_error,
    info as log_info,
    warn as log_warn,
};

/// Install a console subscriber for test drivers.
///
/// `RUST_LOG` wins when set. Otherwise the level is `debug` with
/// `show_results` and `info` without it. Calling this more than once is
/// harmless: later calls leave the first subscriber in place.
pub fn init_console_logging(show_results: bool) {
    let default_level = if show_results { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
