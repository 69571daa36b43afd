//! The [`IndexStore`] trait defining the local index interface.

use crate::error::IndexResult;

/// A raw `(key, value)` pair read from the index.
pub type IndexEntry = (Vec<u8>, Vec<u8>);

/// Forward cursor over index entries in ascending key order.
///
/// Yields `Ok` entries until the index is exhausted, at which point it
/// returns `None`. An `Err` item reports a storage fault.
pub type IndexCursor<'a> = Box<dyn Iterator<Item = IndexResult<IndexEntry>> + 'a>;

/// Ordered byte-key storage with transactions and forward iteration.
///
/// Implementations must be thread-safe (`Send + Sync`). Keys are ordered
/// lexicographically by their bytes. Reads through [`IndexStore::get`] and
/// [`IndexStore::seek`] never observe writes of a transaction that has not
/// been committed.
pub trait IndexStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &[u8]) -> IndexResult<Option<Vec<u8>>>;

    /// Begin a write transaction.
    ///
    /// Write transactions are serialized: a second `begin` blocks until the
    /// first transaction commits or rolls back.
    fn begin(&self) -> IndexResult<Box<dyn IndexTxn + '_>>;

    /// Position a cursor at the first key greater than or equal to `key`.
    ///
    /// Pass an empty slice to iterate from the beginning.
    fn seek(&self, key: &[u8]) -> IndexResult<IndexCursor<'_>>;
}

/// An open write transaction on an [`IndexStore`].
///
/// Dropping a transaction without committing discards its writes.
pub trait IndexTxn {
    /// Stage `value` under `key`.
    fn set(&mut self, key: &[u8], value: &[u8]) -> IndexResult<()>;

    /// Stage removal of `key`. Removing an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> IndexResult<()>;

    /// Make every staged write durable and visible.
    fn commit(self: Box<Self>) -> IndexResult<()>;

    /// Discard every staged write.
    fn rollback(self: Box<Self>) -> IndexResult<()>;
}
