//! Watch command implementation.

use super::load_config;
use crate::cli::WatchArgs;
use crate::error::Result;
use housekeep_docker::DockerClient;
use housekeep_janitor::{EventProcessor, HousekeepWorker, Sweeper};
use housekeep_store::StateStore;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Execute the watch command.
///
/// Runs until CTRL+C or SIGTERM, or until the engine connection is lost.
pub async fn execute_watch(args: WatchArgs, engine: DockerClient) -> Result<()> {
    let config = load_config(&args.common.config)?;
    let processor = EventProcessor::open(StateStore::new(&args.common.state_file))?;

    engine.ping().await?;
    tracing::info!(socket = %engine.socket_path().display(), "Connected to engine");

    let mut worker = HousekeepWorker::new(Arc::new(engine), processor, &config);
    if args.sweeps_enabled() {
        tracing::info!(
            schedule = %config.schedule(),
            max_age = ?config.max_age(),
            dry_run = args.dry_run,
            "Scheduled sweeps enabled"
        );
        if args.dry_run {
            worker = worker.with_sweeper(Sweeper::dry_run());
        }
    } else {
        worker = worker.without_sweeps();
    }

    let cancel = CancellationToken::new();
    let mut sigterm = signal(SignalKind::terminate())?;
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("Received CTRL+C"),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
        }
        shutdown.cancel();
    });

    worker.run(cancel).await?;
    Ok(())
}
