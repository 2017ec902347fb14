//! Error types for the CLI application.

use housekeep_domain::TransportError;
use housekeep_janitor::JanitorError;
use housekeep_store::StoreError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Housekeeping failed
    #[error(transparent)]
    Janitor(#[from] JanitorError),

    /// State file could not be read or written
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The engine could not be reached
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging could not be initialized
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl CliError {
    /// Pull configuration problems out of janitor errors so they read the same
    /// whether they came from the file or the command line.
    pub fn from_config(err: JanitorError) -> Self {
        match err {
            JanitorError::Config(msg) => CliError::Config(msg),
            other => CliError::Janitor(other),
        }
    }
}
