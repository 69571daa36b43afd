//! Error types for client operations.

use thiserror::Error;
use weedblob_index::{DecodeError, EncodeError, IndexError};
use weedblob_remote::RemoteError;

/// Errors returned by [`Client`](crate::Client) operations.
///
/// Every collaborator failure carries the operation name and the key it was
/// working on.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or invalid configuration; raised before any I/O.
    #[error("configuration error: {0}")]
    Config(String),

    /// The key has no record in the local index.
    #[error("key not found: {key:?}")]
    NotFound { key: String },

    /// Put was asked to store a key that already has a record.
    #[error("key already exists: {key:?}")]
    AlreadyExists { key: String },

    /// The stored record for a key could not be decoded.
    #[error("corrupt index record for {key:?}: {source}")]
    CorruptRecord {
        key: String,
        #[source]
        source: DecodeError,
    },

    /// The record could not be encoded for storage.
    #[error("{op} {key:?}: {source}")]
    Encode {
        op: &'static str,
        key: String,
        #[source]
        source: EncodeError,
    },

    /// Beginning, committing, or rolling back an index transaction failed.
    #[error("{op} {key:?}: transaction failed: {source}")]
    Transaction {
        op: &'static str,
        key: String,
        #[source]
        source: IndexError,
    },

    /// Reading, writing, or iterating the local index failed.
    #[error("{op} {key:?}: index error: {source}")]
    Index {
        op: &'static str,
        key: String,
        #[source]
        source: IndexError,
    },

    /// The remote store rejected the request or could not be reached.
    #[error("{op} {key:?}: remote error: {source}")]
    Remote {
        op: &'static str,
        key: String,
        #[source]
        source: RemoteError,
    },

    /// I/O error outside the collaborators (e.g. creating the index directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub(crate) fn transaction(op: &'static str, key: &str, source: IndexError) -> Self {
        ClientError::Transaction {
            op,
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn index(op: &'static str, key: &str, source: IndexError) -> Self {
        ClientError::Index {
            op,
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn remote(op: &'static str, key: &str, source: RemoteError) -> Self {
        ClientError::Remote {
            op,
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn corrupt(key: &str, source: DecodeError) -> Self {
        ClientError::CorruptRecord {
            key: key.to_string(),
            source,
        }
    }

    /// Returns `true` for [`ClientError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// Returns `true` for [`ClientError::AlreadyExists`].
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClientError::AlreadyExists { .. })
    }

    /// Returns `true` if the remote store could not be reached.
    pub fn is_remote_unavailable(&self) -> bool {
        matches!(self, ClientError::Remote { source, .. } if source.is_unavailable())
    }
}

/// Convenience alias for client results.
pub type ClientResult<T> = Result<T, ClientError>;
