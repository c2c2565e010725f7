//! Diagnostic logging setup.
//!
//! Logs go to stderr so stdout stays reserved for results. Verbosity comes
//! from `TEXT_PATCHER_LOG` (an `EnvFilter` directive such as `debug` or
//! `text_patcher=trace`) and defaults to `warn`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TEXT_PATCHER_LOG";

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    init_with_default("warn");
}

/// Like [`init`], with a fallback directive used when `TEXT_PATCHER_LOG` is unset.
pub fn init_with_default(default_directive: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
