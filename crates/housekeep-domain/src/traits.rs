//! Trait definitions for engine interactions
//!
//! These traits define the boundary between the tracker and the container
//! engine. The Docker implementation lives in `housekeep-docker`; tests use
//! in-memory mocks.

use crate::{ContainerInfo, DeletedItem, Event, ImageDeleteError, TransportError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Parameters of an event stream subscription
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Only events at or after this time (second granularity on the wire)
    pub since: Option<DateTime<Utc>>,

    /// Stop streaming after this time
    pub until: Option<DateTime<Utc>>,

    /// Engine-side filters, e.g. `{"type": ["image", "container"]}`
    pub filters: HashMap<String, Vec<String>>,
}

impl EventQuery {
    /// Subscribe to everything since `since`
    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            ..Default::default()
        }
    }

    /// Restrict the subscription with an engine-side filter
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.entry(name.into()).or_default().push(value.into());
        self
    }
}

/// A live subscription to engine events
///
/// Waiting for the next event is the only suspension point. Dropping the
/// future returned by [`EventStream::next_event`] cancels the wait.
#[async_trait]
pub trait EventStream: Send {
    /// Next event, or `None` once the engine closes the stream
    async fn next_event(&mut self) -> Result<Option<Event>, TransportError>;
}

/// Operations the tracker needs from the container engine
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Open an event stream
    ///
    /// The stream cannot be rewound; resuming means calling this again with
    /// a new `since`.
    async fn stream_events(&self, query: EventQuery) -> Result<Box<dyn EventStream>, TransportError>;

    /// Look up a container
    ///
    /// Returns `Ok(None)` when the container has already disappeared.
    async fn inspect_container(&self, id: &str) -> Result<Option<ContainerInfo>, TransportError>;

    /// Delete an image
    async fn delete_image(&self, id: &str) -> Result<Vec<DeletedItem>, ImageDeleteError>;
}
