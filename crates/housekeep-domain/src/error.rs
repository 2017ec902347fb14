//! Error types for engine operations

use thiserror::Error;

/// The engine could not be reached, or answered in a way the client cannot use
///
/// Fatal to the watch loop; the caller decides whether to reconnect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Failed to open the control socket
    #[error("Failed to connect to engine at {path}: {reason}")]
    Connect {
        /// Socket path
        path: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// HTTP exchange failed or the connection dropped
    #[error("HTTP error: {0}")]
    Http(String),

    /// Engine answered with an unexpected status
    #[error("Engine returned status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message from the engine's error body
        message: String,
    },

    /// Response body could not be decoded
    #[error("Invalid engine response: {0}")]
    Decode(String),
}

/// Failure to delete a single image
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageDeleteError {
    /// The image no longer exists (HTTP 404)
    #[error("No such image: {message}")]
    NotFound {
        /// Message from the engine
        message: String,
    },

    /// The image is in use or has dependent children (HTTP 409)
    #[error("Conflict: {message}")]
    Conflict {
        /// Message from the engine
        message: String,
    },

    /// Any other engine-reported failure
    #[error("Engine returned status {status}: {message}")]
    Other {
        /// HTTP status code
        status: u16,
        /// Message from the engine
        message: String,
    },

    /// The request never got an answer
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ImageDeleteError {
    /// Map an engine status and message to the matching failure class
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => Self::NotFound { message },
            409 => Self::Conflict { message },
            status => Self::Other { status, message },
        }
    }

    /// True for failures a sweep logs and moves past
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Conflict { .. })
    }
}
