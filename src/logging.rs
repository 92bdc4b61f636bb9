//! Diagnostic logging setup.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary. Logs go to stderr so stdout stays clean for `--output json`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive that overrides the
/// verbosity flag, e.g. `CODESIFT_LOG=codesift::fetch=debug`.
pub const LOG_ENV: &str = "CODESIFT_LOG";

/// Filter directive for a `-v` count.
#[must_use]
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "codesift=info,warn",
        2 => "codesift=debug,info",
        _ => "trace",
    }
}

/// Install the global subscriber. Calling it twice is harmless; the first
/// subscriber stays in place.
pub fn initialize(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity >= 2)
        .try_init();
}
