//! docker-housekeep domain layer
//!
//! Core model shared by every other crate: the persisted [`State`], the
//! engine [`Event`]s that drive it, and the trait seams through which the
//! container engine is reached.
//!
//! ## Key Concepts
//!
//! - **State**: image id → last-used timestamp, plus the event watermark
//! - **Event**: an immutable lifecycle record emitted by the engine
//! - **Watermark**: time of the last durably processed event
//! - **Cutoff**: `now - max_age`, the staleness boundary used by sweeps
//!
//! ## Architecture
//!
//! No I/O happens here. The engine transport lives in `housekeep-docker`,
//! persistence in `housekeep-store`, and the processing logic in
//! `housekeep-janitor`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod state;
pub mod traits;

// Re-exports for convenience
pub use error::{ImageDeleteError, TransportError};
pub use event::{ContainerInfo, DeletedItem, Event, EventEffect};
pub use state::{State, WatermarkAdvance};
pub use traits::{EngineClient, EventQuery, EventStream};
