//! Subscriber setup for binaries. The library itself only emits events.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber on stderr. `RUST_LOG` wins over `verbose`,
/// which otherwise selects `debug` instead of `info`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
