//! Background worker for continuous housekeeping

use crate::{
    DrainEnd, EventProcessor, HousekeepConfig, JanitorError, SweepReport, SweepSchedule, SweepTotals,
    Sweeper,
};
use chrono::Local;
use housekeep_domain::EngineClient;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

type SweepFuture<'a> = Pin<Box<dyn Future<Output = Result<SweepReport, JanitorError>> + 'a>>;

/// Worker that follows the engine's events and sweeps on a schedule
///
/// Event processing and sweeps run concurrently in one task. The sweeper
/// only holds the state lock while it takes its snapshot, so events keep
/// being recorded while deletions are in flight.
///
/// # Examples
///
/// ```no_run
/// use housekeep_docker::DockerClient;
/// use housekeep_janitor::{EventProcessor, HousekeepConfig, HousekeepWorker};
/// use housekeep_store::StateStore;
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let processor = EventProcessor::open(StateStore::new("state.json"))?;
///     let config = HousekeepConfig::default();
///     let mut worker = HousekeepWorker::new(Arc::new(DockerClient::new()), processor, &config);
///
///     let cancel = CancellationToken::new();
///     worker.run(cancel).await?;
///     Ok(())
/// }
/// ```
pub struct HousekeepWorker<E: EngineClient + ?Sized> {
    engine: Arc<E>,
    processor: EventProcessor,
    sweeper: Sweeper,
    schedule: Option<SweepSchedule>,
    max_age: Duration,
    totals: SweepTotals,
}

impl<E: EngineClient + ?Sized> HousekeepWorker<E> {
    /// Create a worker that sweeps on the configured schedule
    pub fn new(engine: Arc<E>, processor: EventProcessor, config: &HousekeepConfig) -> Self {
        Self {
            engine,
            processor,
            sweeper: Sweeper::new(),
            schedule: Some(config.schedule().clone()),
            max_age: config.max_age(),
            totals: SweepTotals::new(),
        }
    }

    /// Only process events, never sweep
    pub fn without_sweeps(mut self) -> Self {
        self.schedule = None;
        self
    }

    /// Use a different sweeper, e.g. a dry-run one
    pub fn with_sweeper(mut self, sweeper: Sweeper) -> Self {
        self.sweeper = sweeper;
        self
    }

    /// Event processor driven by this worker
    pub fn processor(&self) -> &EventProcessor {
        &self.processor
    }

    /// Totals of the sweeps run so far
    pub fn totals(&self) -> &SweepTotals {
        &self.totals
    }

    /// Run until `cancel` fires
    ///
    /// Returns `Ok(())` on cancellation. Losing the engine connection, a
    /// state write failure, or a sweep aborted by an unexpected engine error
    /// stop the worker with an error. A sweep in flight at shutdown is
    /// dropped.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), JanitorError> {
        let Self {
            engine,
            processor,
            sweeper,
            schedule,
            max_age,
            totals,
        } = self;
        let engine: &E = engine.as_ref();
        let state = processor.state();
        let max_age = *max_age;

        let query = processor.resume_query().await;
        tracing::info!(since = ?query.since, "Watching engine events");
        let mut stream = engine.stream_events(query).await?;

        let drain = processor.drain(engine, stream.as_mut(), &cancel);
        tokio::pin!(drain);

        let mut next_sweep = schedule.as_ref().and_then(schedule_next);
        let mut running: Option<SweepFuture<'_>> = None;

        let result = loop {
            let sweep_due = async move {
                match next_sweep {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;
                end = &mut drain => {
                    break match end {
                        Ok(DrainEnd::Cancelled) => Ok(()),
                        Ok(DrainEnd::StreamEnded) => {
                            Err(JanitorError::Worker("engine closed the event stream".to_string()))
                        }
                        Err(e) => Err(e),
                    };
                }
                result = async {
                    match running.as_mut() {
                        Some(sweep) => sweep.await,
                        None => std::future::pending().await,
                    }
                }, if running.is_some() => {
                    running = None;
                    match result {
                        Ok(report) => {
                            totals.record(&report);
                            tracing::info!(totals = %totals.summary(), "{}", report.summary());
                        }
                        Err(e) => break Err(e),
                    }
                    next_sweep = schedule.as_ref().and_then(schedule_next);
                }
                _ = sweep_due, if running.is_none() => {
                    tracing::info!(max_age = ?max_age, "Starting scheduled sweep");
                    running = Some(Box::pin(sweeper.sweep(engine, &state, max_age)));
                }
            }
        };

        if running.is_some() {
            tracing::info!("Dropping sweep in progress");
        }
        tracing::info!(totals = %totals.summary(), "Worker stopped");
        result
    }
}

/// Instant of the next scheduled sweep
fn schedule_next(schedule: &SweepSchedule) -> Option<Instant> {
    let Some((at, delay)) = schedule.delay_until_next(Local::now()) else {
        tracing::warn!(schedule = %schedule, "Sweep schedule has no future run time");
        return None;
    };
    tracing::info!("Scheduled next sweep for {}", at.format("%Y-%m-%d %H:%M:%S"));
    Some(Instant::now() + delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEngine;
    use chrono::{TimeZone, Utc};
    use housekeep_domain::{Event, ImageDeleteError, TransportError};
    use housekeep_store::StateStore;
    use tempfile::TempDir;

    fn every_second() -> HousekeepConfig {
        HousekeepConfig {
            sweep_schedule: SweepSchedule::parse("* * * * * *").unwrap(),
            max_age: Duration::from_secs(3600),
        }
    }

    fn processor(dir: &TempDir) -> EventProcessor {
        EventProcessor::open(StateStore::new(dir.path().join("state.json"))).unwrap()
    }

    fn old_image_event() -> Event {
        Event::new("image", "tag", "sha256:old", Utc.timestamp_opt(1000, 0).unwrap())
    }

    #[tokio::test]
    async fn test_stream_end_stops_worker_with_error() {
        let dir = TempDir::new().unwrap();
        let engine = Arc::new(MockEngine::new().with_events(vec![old_image_event()]));
        let mut worker = HousekeepWorker::new(engine, processor(&dir), &every_second()).without_sweeps();

        let err = worker.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, JanitorError::Worker(_)));

        // The event was still recorded before the stream closed
        let persisted = worker.processor().store().load().unwrap();
        assert!(persisted.last_used("sha256:old").is_some());
    }

    #[tokio::test]
    async fn test_cancel_stops_worker_cleanly() {
        let dir = TempDir::new().unwrap();
        let engine = Arc::new(MockEngine::new().keep_open());
        let mut worker = HousekeepWorker::new(engine, processor(&dir), &every_second()).without_sweeps();

        let cancel = CancellationToken::new();
        cancel.cancel();
        worker.run(cancel).await.unwrap();
        assert_eq!(worker.totals().sweep_count, 0);
    }

    #[tokio::test]
    async fn test_scheduled_sweep_runs_while_watching() {
        let dir = TempDir::new().unwrap();
        let engine = Arc::new(MockEngine::new().keep_open().with_events(vec![old_image_event()]));
        let mut worker = HousekeepWorker::new(Arc::clone(&engine), processor(&dir), &every_second());

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        let watcher = Arc::clone(&engine);
        tokio::spawn(async move {
            for _ in 0..50 {
                if !watcher.deletions().is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            stopper.cancel();
        });

        worker.run(cancel).await.unwrap();

        assert!(engine.deletions().contains(&"sha256:old".to_string()));
        assert!(worker.totals().sweep_count >= 1);
        assert!(worker.totals().deleted >= 1);
    }

    #[tokio::test]
    async fn test_dry_run_sweeper_deletes_nothing_while_watching() {
        let dir = TempDir::new().unwrap();
        let engine = Arc::new(MockEngine::new().keep_open().with_events(vec![old_image_event()]));
        let mut worker = HousekeepWorker::new(Arc::clone(&engine), processor(&dir), &every_second())
            .with_sweeper(Sweeper::dry_run());

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            stopper.cancel();
        });

        worker.run(cancel).await.unwrap();

        assert!(worker.totals().sweep_count >= 1);
        assert_eq!(worker.totals().deleted, 0);
        assert!(engine.deletions().is_empty());
        let persisted = worker.processor().store().load().unwrap();
        assert!(persisted.last_used("sha256:old").is_some());
    }

    #[tokio::test]
    async fn test_aborted_sweep_stops_worker() {
        let dir = TempDir::new().unwrap();
        let engine = Arc::new(
            MockEngine::new()
                .keep_open()
                .with_events(vec![old_image_event()])
                .with_delete_error(
                    "sha256:old",
                    ImageDeleteError::Transport(TransportError::Http("broken pipe".into())),
                ),
        );
        let mut worker = HousekeepWorker::new(engine, processor(&dir), &every_second());

        let result = tokio::time::timeout(Duration::from_secs(10), worker.run(CancellationToken::new()))
            .await
            .expect("worker should stop on its own");
        assert!(matches!(result, Err(JanitorError::ImageDelete { .. })));
    }
}
