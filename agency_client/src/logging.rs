//! Logging setup for the client binary.
//!
//! The library logs through the `log` facade; records are forwarded into
//! `tracing` and printed to stderr so they never mix with command output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "warn,agency360=info,agency_client=info,reqwest=warn,hyper=warn";

/// Filter used when `RUST_LOG` is not set and debug output was requested
pub const DEBUG_FILTER: &str = "info,agency360=debug,agency_client=debug,reqwest=warn,hyper=warn";

/// Build the filter: `RUST_LOG` wins, otherwise the default for `debug`.
pub fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { DEBUG_FILTER } else { DEFAULT_FILTER })
    })
}

/// Initialize logging
///
/// Safe to call more than once; later calls are ignored.
///
/// # Example
///
/// ```no_run
/// agency_client::logging::init(false);
/// tracing::info!("Client starting");
/// ```
pub fn init(debug: bool) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug)
        .with_line_number(debug);

    if tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!("Logging initialized");
    }
}
