//! Event processing: folding the engine's event stream into the usage record

use crate::{JanitorError, SharedState};
use chrono::{DateTime, Utc};
use housekeep_domain::{EngineClient, Event, EventEffect, EventQuery, EventStream, WatermarkAdvance};
use housekeep_store::StateStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// What processing one event did to the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The image's last use was set to the event time
    Touched {
        /// Image id
        image: String,
    },
    /// The image was removed from the record
    Forgotten {
        /// Image id
        image: String,
    },
    /// A deleted image was not being tracked
    MissingEntry {
        /// Image id
        image: String,
    },
    /// The container was gone before it could be inspected
    ContainerGone {
        /// Container id
        container: String,
    },
    /// The event does not concern image usage
    Ignored,
}

/// Why [`EventProcessor::drain`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainEnd {
    /// The engine closed the stream
    StreamEnded,
    /// Shutdown was requested
    Cancelled,
}

/// Single writer of the usage record
///
/// Every processed event is persisted before the next one is read, so the
/// state file always reflects a prefix of the event stream.
pub struct EventProcessor {
    state: SharedState,
    store: StateStore,
}

impl EventProcessor {
    /// Create a processor over an already loaded state
    pub fn new(state: SharedState, store: StateStore) -> Self {
        Self { state, store }
    }

    /// Load the state from `store` and create a processor over it
    pub fn open(store: StateStore) -> Result<Self, JanitorError> {
        let state = store.load()?;
        tracing::info!(
            path = %store.path().display(),
            images = state.len(),
            watermark = ?state.watermark,
            "Loaded state"
        );
        Ok(Self::new(Arc::new(Mutex::new(state)), store))
    }

    /// Handle to the shared state
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Backing store
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Subscription that resumes where the last run stopped
    ///
    /// Without a watermark the engine replays everything it still retains.
    pub async fn resume_query(&self) -> EventQuery {
        let since = self.state.lock().await.watermark.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        EventQuery::since(since)
    }

    /// Apply one event and persist the result
    ///
    /// Container lookups happen before the state lock is taken. A transport
    /// failure during the lookup leaves the state untouched.
    pub async fn process<E>(&self, engine: &E, event: &Event) -> Result<ProcessOutcome, JanitorError>
    where
        E: EngineClient + ?Sized,
    {
        let effect = event.effect();
        let container = match effect {
            EventEffect::InspectContainer { container } => engine.inspect_container(container).await?,
            _ => None,
        };

        let mut state = self.state.lock().await;

        if let WatermarkAdvance::Regressed { current } = state.advance_watermark(event.time) {
            tracing::warn!(
                event_time = %event.time,
                watermark = %current,
                "Event is older than the watermark, keeping the watermark"
            );
        }

        let outcome = match effect {
            EventEffect::Touch { image } => {
                state.touch(image, event.time);
                ProcessOutcome::Touched {
                    image: image.to_string(),
                }
            }
            EventEffect::Forget { image } => {
                if state.forget(image) {
                    ProcessOutcome::Forgotten {
                        image: image.to_string(),
                    }
                } else {
                    tracing::warn!(image = %image, "Inconsistent state: deleted image was not tracked");
                    ProcessOutcome::MissingEntry {
                        image: image.to_string(),
                    }
                }
            }
            EventEffect::InspectContainer { container: id } => match container {
                Some(info) => {
                    state.touch(info.image.clone(), event.time);
                    ProcessOutcome::Touched { image: info.image }
                }
                None => {
                    tracing::debug!(container = %id, "Container is already gone");
                    ProcessOutcome::ContainerGone {
                        container: id.to_string(),
                    }
                }
            },
            EventEffect::Ignore => ProcessOutcome::Ignored,
        };

        self.store.persist(&state)?;

        match &outcome {
            ProcessOutcome::Touched { image } => {
                tracing::info!(image = %image, last_used = %event.time, "Recorded image use");
            }
            ProcessOutcome::Forgotten { image } => {
                tracing::info!(image = %image, "Removed image from state");
            }
            _ => {}
        }

        tracing::debug!(
            kind = %event.kind,
            action = %event.action,
            subject = %event.subject_id,
            outcome = ?outcome,
            "Processed event"
        );

        Ok(outcome)
    }

    /// Process events from `stream` until it ends or `cancel` fires
    ///
    /// Cancellation drops the pending read; an event already being processed
    /// is finished and persisted first.
    pub async fn drain<E>(
        &self,
        engine: &E,
        stream: &mut dyn EventStream,
        cancel: &CancellationToken,
    ) -> Result<DrainEnd, JanitorError>
    where
        E: EngineClient + ?Sized,
    {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(DrainEnd::Cancelled),
                next = stream.next_event() => next?,
            };

            match next {
                Some(event) => {
                    self.process(engine, &event).await?;
                }
                None => return Ok(DrainEnd::StreamEnded),
            }
        }
    }

    /// Subscribe from the watermark and drain the stream
    pub async fn run<E>(&self, engine: &E, cancel: &CancellationToken) -> Result<DrainEnd, JanitorError>
    where
        E: EngineClient + ?Sized,
    {
        let query = self.resume_query().await;
        tracing::info!(since = ?query.since, "Subscribing to engine events");

        let mut stream = engine.stream_events(query).await?;
        self.drain(engine, stream.as_mut(), cancel).await
    }
}
