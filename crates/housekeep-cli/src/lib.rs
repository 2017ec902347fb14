//! docker-housekeep CLI library.
//!
//! Argument parsing, log setup and the `watch` and `sweep` commands behind
//! the `docker-housekeep` binary.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

pub use cli::{Cli, Command};
pub use error::{CliError, Result};
pub use logging::init_logging;
