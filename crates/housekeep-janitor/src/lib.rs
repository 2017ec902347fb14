//! Housekeep Janitor
//!
//! Event-driven image usage tracking and scheduled cleanup of unused images.
//!
//! # Overview
//!
//! The Janitor is responsible for:
//! - **Event processing**: Folding the engine's event stream into the usage record
//! - **Sweeping**: Deleting images whose last use is older than the maximum age
//! - **Scheduling**: Running sweeps on a cron-style schedule while events keep flowing
//!
//! # Usage
//!
//! ## One-time Sweep
//!
//! ```no_run
//! use housekeep_docker::DockerClient;
//! use housekeep_janitor::{HousekeepConfig, SharedState, Sweeper};
//! use housekeep_store::StateStore;
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HousekeepConfig::from_file("/etc/docker-housekeep.toml")?;
//! let state: SharedState = Arc::new(Mutex::new(StateStore::new("state.json").load()?));
//! let engine = DockerClient::new();
//!
//! let report = Sweeper::new().sweep(&engine, &state, config.max_age()).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Worker
//!
//! ```no_run
//! use housekeep_docker::DockerClient;
//! use housekeep_janitor::{EventProcessor, HousekeepConfig, HousekeepWorker};
//! use housekeep_store::StateStore;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HousekeepConfig::default();
//! let processor = EventProcessor::open(StateStore::new("state.json"))?;
//! let mut worker = HousekeepWorker::new(Arc::new(DockerClient::new()), processor, &config);
//!
//! // Run until the token is cancelled or the engine goes away
//! worker.run(CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! sweep-schedule = "0 6 * * *"
//! max-age = "1w"
//! ```

#![warn(missing_docs)]

use housekeep_domain::State;
use std::sync::Arc;
use tokio::sync::Mutex;

mod config;
mod error;
mod processor;
mod report;
mod schedule;
mod sweeper;
mod worker;

#[cfg(test)]
mod mock;

pub use config::{parse_max_age, HousekeepConfig, DEFAULT_MAX_AGE, DEFAULT_SWEEP_SCHEDULE};
pub use error::JanitorError;
pub use processor::{DrainEnd, EventProcessor, ProcessOutcome};
pub use report::{SweepReport, SweepTotals};
pub use schedule::SweepSchedule;
pub use sweeper::Sweeper;
pub use worker::HousekeepWorker;

/// Usage record shared between the event processor and the sweeper
pub type SharedState = Arc<Mutex<State>>;
