//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/docker-housekeep.toml";

/// docker-housekeep - Delete Docker images that have not been used recently.
#[derive(Debug, Parser)]
#[command(name = "docker-housekeep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Docker control socket (default: $DOCKER_HOST or /var/run/docker.sock)
    #[arg(long, global = true, env = "DOCKER_HOUSEKEEP_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Print timestamps in logs
    #[arg(long, global = true)]
    pub log_timestamps: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Monitor engine events continuously; optionally clean up on schedule
    Watch(WatchArgs),

    /// Perform an immediate one-time image cleanup
    Sweep(SweepArgs),
}

/// Arguments shared by all commands.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Path where collected image history is stored
    #[arg(long, default_value = "state.json")]
    pub state_file: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for the watch command.
#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Perform image cleanup according to schedule while watching (default)
    #[arg(long, overrides_with = "no_sweep")]
    pub sweep: bool,

    /// Only record events, never clean up
    #[arg(long, overrides_with = "sweep")]
    pub no_sweep: bool,

    /// Log what scheduled sweeps would delete without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

impl WatchArgs {
    /// True unless `--no-sweep` was the last of the sweep flags given.
    pub fn sweeps_enabled(&self) -> bool {
        !self.no_sweep
    }
}

/// Arguments for the sweep command.
#[derive(Debug, Args)]
pub struct SweepArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Override the configured maximum image age (e.g. "3d12h")
    #[arg(long)]
    pub max_age: Option<String>,

    /// Report what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

impl Command {
    /// Arguments shared by every command.
    pub fn common(&self) -> &CommonArgs {
        match self {
            Command::Watch(args) => &args.common,
            Command::Sweep(args) => &args.common,
        }
    }
}
