//! Error types for Janitor operations

use housekeep_domain::{ImageDeleteError, TransportError};
use housekeep_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Janitor operations
#[derive(Error, Debug)]
pub enum JanitorError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// The engine is unreachable or the event stream dropped
    #[error("Engine error: {0}")]
    Transport(#[from] TransportError),

    /// An image deletion failed in a way a sweep cannot skip
    #[error("Failed to delete image {image}: {source}")]
    ImageDelete {
        /// Image being deleted
        image: String,
        /// Engine failure
        #[source]
        source: ImageDeleteError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The watch worker stopped for a reason other than shutdown
    #[error("Worker error: {0}")]
    Worker(String),
}
