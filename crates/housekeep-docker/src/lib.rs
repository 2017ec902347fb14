//! docker-housekeep engine client
//!
//! Implements [`EngineClient`](housekeep_domain::EngineClient) against the
//! Docker Engine API, spoken as HTTP/1 over the local control socket.
//!
//! # Endpoints
//!
//! - `GET /events` - newline-delimited JSON event stream
//! - `GET /containers/{id}/json` - container inspect
//! - `DELETE /images/{id}` - image removal
//!
//! # Examples
//!
//! ```no_run
//! use housekeep_docker::DockerClient;
//! use housekeep_domain::{EngineClient, EventQuery};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DockerClient::new();
//! let mut events = client.stream_events(EventQuery::default()).await?;
//! while let Some(event) = events.next_event().await? {
//!     println!("{} {} {}", event.kind, event.action, event.subject_id);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod lines;
mod stream;
mod wire;

pub use client::{DockerClient, DEFAULT_SOCKET_PATH};
pub use stream::DockerEventStream;
