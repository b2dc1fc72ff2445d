//! Tracing setup shared by both binaries.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

/// Initialize logging to stderr with a time-only timestamp.
///
/// stdout carries the line protocol of the persistent converter, so log output
/// must never go there. `RUST_LOG` wins over `verbose`; the default level is info.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();
}
