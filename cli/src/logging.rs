//! Diagnostic logging setup.
//!
//! Logs go to stderr so they never mix with command output. The filter comes
//! from `ROUTECTL_LOG` (same syntax as `RUST_LOG`); without it only warnings
//! are shown, or debug events for this crate when `--verbose` is passed.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "ROUTECTL_LOG";

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let default = if verbose { "warn,routectl=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
