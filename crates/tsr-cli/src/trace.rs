//! Tracing initialization for the CLI.
//!
//! Controlled by `TSR_LOG` (env-filter syntax); defaults to warnings only.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("TSR_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
