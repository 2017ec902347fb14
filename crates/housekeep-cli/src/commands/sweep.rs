//! Sweep command implementation.

use super::load_config;
use crate::cli::SweepArgs;
use crate::error::{CliError, Result};
use housekeep_domain::EngineClient;
use housekeep_janitor::{parse_max_age, SharedState, SweepReport, Sweeper};
use housekeep_store::StateStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Execute the sweep command.
///
/// Prints the pass summary to stdout.
pub async fn execute_sweep<E>(args: SweepArgs, engine: &E) -> Result<()>
where
    E: EngineClient + ?Sized,
{
    let report = run_sweep(&args, engine).await?;
    println!("{}", report.summary());
    Ok(())
}

async fn run_sweep<E>(args: &SweepArgs, engine: &E) -> Result<SweepReport>
where
    E: EngineClient + ?Sized,
{
    let config = load_config(&args.common.config)?;
    let max_age = match &args.max_age {
        Some(value) => parse_max_age(value).map_err(CliError::from_config)?,
        None => config.max_age(),
    };

    let state: SharedState = Arc::new(Mutex::new(StateStore::new(&args.common.state_file).load()?));
    let sweeper = if args.dry_run {
        Sweeper::dry_run()
    } else {
        Sweeper::new()
    };

    Ok(sweeper.sweep(engine, &state, max_age).await?)
}
