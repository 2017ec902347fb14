//! Scripted engine for tests

use async_trait::async_trait;
use housekeep_domain::{
    ContainerInfo, DeletedItem, EngineClient, Event, EventQuery, EventStream, ImageDeleteError,
    TransportError,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Engine whose events, containers and delete answers are fixed up front
#[derive(Default)]
pub(crate) struct MockEngine {
    events: Vec<Event>,
    keep_open: bool,
    containers: HashMap<String, String>,
    delete_errors: HashMap<String, ImageDeleteError>,
    inspect_error: Option<TransportError>,
    queries: Mutex<Vec<EventQuery>>,
    deletions: Mutex<Vec<String>>,
}

impl MockEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Events every stream replays, in order
    pub(crate) fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    /// Keep streams open after the scripted events instead of ending them
    pub(crate) fn keep_open(mut self) -> Self {
        self.keep_open = true;
        self
    }

    pub(crate) fn with_container(mut self, id: &str, image: &str) -> Self {
        self.containers.insert(id.to_string(), image.to_string());
        self
    }

    pub(crate) fn with_delete_error(mut self, image: &str, error: ImageDeleteError) -> Self {
        self.delete_errors.insert(image.to_string(), error);
        self
    }

    pub(crate) fn with_inspect_error(mut self, error: TransportError) -> Self {
        self.inspect_error = Some(error);
        self
    }

    /// Delete calls received so far, in order
    pub(crate) fn deletions(&self) -> Vec<String> {
        self.deletions.lock().unwrap().clone()
    }

    /// Stream subscriptions received so far
    pub(crate) fn queries(&self) -> Vec<EventQuery> {
        self.queries.lock().unwrap().clone()
    }
}

struct MockStream {
    events: VecDeque<Event>,
    keep_open: bool,
}

#[async_trait]
impl EventStream for MockStream {
    async fn next_event(&mut self) -> Result<Option<Event>, TransportError> {
        match self.events.pop_front() {
            Some(event) => Ok(Some(event)),
            None if self.keep_open => std::future::pending().await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl EngineClient for MockEngine {
    async fn stream_events(&self, query: EventQuery) -> Result<Box<dyn EventStream>, TransportError> {
        self.queries.lock().unwrap().push(query);
        Ok(Box::new(MockStream {
            events: self.events.iter().cloned().collect(),
            keep_open: self.keep_open,
        }))
    }

    async fn inspect_container(&self, id: &str) -> Result<Option<ContainerInfo>, TransportError> {
        if let Some(error) = &self.inspect_error {
            return Err(error.clone());
        }
        Ok(self.containers.get(id).map(|image| ContainerInfo {
            id: id.to_string(),
            image: image.clone(),
        }))
    }

    async fn delete_image(&self, id: &str) -> Result<Vec<DeletedItem>, ImageDeleteError> {
        self.deletions.lock().unwrap().push(id.to_string());
        match self.delete_errors.get(id) {
            Some(error) => Err(error.clone()),
            None => Ok(vec![DeletedItem::Deleted(id.to_string())]),
        }
    }
}
