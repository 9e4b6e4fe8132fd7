use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV_VAR: &str = "TRISYNC_LOG";

/// Log to stderr so stdout stays usable for command output.
pub fn init_logger(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = env::var(LOG_ENV_VAR).unwrap_or_else(|_| default.to_string());
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter_layer)
        .init();
}
