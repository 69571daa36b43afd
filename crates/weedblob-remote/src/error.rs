//! Error types for remote store operations.

use thiserror::Error;

/// Errors that can occur while talking to the remote object store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The store could not be reached (connection refused, DNS, reset...).
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// No object exists under the given file id.
    #[error("remote object not found: {0}")]
    NotFound(String),

    /// The store answered with an unexpected HTTP status.
    #[error("remote store returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The store answered, but the response made no sense.
    #[error("remote protocol error: {0}")]
    Protocol(String),

    /// The file id is not in the `volume,needle` form the store issues.
    #[error("invalid file id: {0:?}")]
    InvalidFileId(String),

    /// Reading the upload body failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    /// Returns `true` if the store itself could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, RemoteError::Unavailable(_))
    }

    /// Returns `true` if the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

/// Convenience alias for remote store results.
pub type RemoteResult<T> = Result<T, RemoteError>;
