//! Command implementations.

pub mod sweep;
pub mod watch;

pub use self::sweep::execute_sweep;
pub use self::watch::execute_watch;

use crate::error::{CliError, Result};
use housekeep_docker::DockerClient;
use housekeep_janitor::HousekeepConfig;
use std::path::Path;

/// Engine client for an explicit socket, or the one named by the environment.
pub fn engine_client(socket: Option<&Path>) -> DockerClient {
    match socket {
        Some(path) => DockerClient::with_socket(path),
        None => DockerClient::from_env(),
    }
}

/// Load the configuration file; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<HousekeepConfig> {
    let config = HousekeepConfig::from_file(path).map_err(CliError::from_config)?;
    tracing::debug!(
        path = %path.display(),
        sweep_schedule = %config.schedule(),
        max_age = ?config.max_age(),
        "Loaded configuration"
    );
    Ok(config)
}
