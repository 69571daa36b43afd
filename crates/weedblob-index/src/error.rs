//! Error types for the index crate.

/// Errors raised by an [`IndexStore`](crate::IndexStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The storage engine reported a fault while reading or writing.
    #[error("index storage error: {0}")]
    Storage(String),

    /// A transaction could not be started, committed, or rolled back.
    #[error("index transaction error: {0}")]
    Transaction(String),

    /// The database file could not be opened or created.
    #[error("failed to open index at {path}: {reason}")]
    Open { path: String, reason: String },

    /// A lock guarding in-memory state was poisoned by a panicking thread.
    #[error("index lock poisoned: {0}")]
    Poisoned(String),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced when decoding a stored index record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The value is empty or shorter than its framing requires.
    #[error("record truncated: {0}")]
    Truncated(String),

    /// The leading format byte is not one this codec understands.
    #[error("unsupported record version {0}")]
    UnsupportedVersion(u8),

    /// Bytes remain after a complete record was read.
    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),

    /// The record body could not be deserialized.
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Errors produced when encoding an index record.
#[derive(Debug, thiserror::Error)]
#[error("failed to encode record: {0}")]
pub struct EncodeError(pub String);

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;

impl From<redb::DatabaseError> for IndexError {
    fn from(err: redb::DatabaseError) -> Self {
        IndexError::Storage(err.to_string())
    }
}

impl From<redb::TransactionError> for IndexError {
    fn from(err: redb::TransactionError) -> Self {
        IndexError::Transaction(err.to_string())
    }
}

impl From<redb::TableError> for IndexError {
    fn from(err: redb::TableError) -> Self {
        IndexError::Storage(err.to_string())
    }
}

impl From<redb::StorageError> for IndexError {
    fn from(err: redb::StorageError) -> Self {
        IndexError::Storage(err.to_string())
    }
}

impl From<redb::CommitError> for IndexError {
    fn from(err: redb::CommitError) -> Self {
        IndexError::Transaction(err.to_string())
    }
}
