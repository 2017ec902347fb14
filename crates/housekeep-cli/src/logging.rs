//! Log output setup.

use crate::error::{CliError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence; otherwise the level is `info`, or `debug`
/// when `verbose` is set.
pub fn init_logging(verbose: bool, timestamps: bool) -> Result<()> {
    let filter = build_filter(verbose, std::env::var("RUST_LOG").ok().as_deref())?;
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false);

    let installed = if timestamps {
        builder.try_init()
    } else {
        builder.without_time().try_init()
    };
    installed.map_err(|e| CliError::Logging(e.to_string()))
}

fn build_filter(verbose: bool, env: Option<&str>) -> Result<EnvFilter> {
    match env.map(str::trim).filter(|directives| !directives.is_empty()) {
        Some(directives) => {
            EnvFilter::try_new(directives).map_err(|e| CliError::Logging(format!("RUST_LOG: {e}")))
        }
        None => Ok(EnvFilter::new(if verbose { "debug" } else { "info" })),
    }
}
