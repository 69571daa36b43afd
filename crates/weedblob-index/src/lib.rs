//! Local key index for weedblob.
//!
//! The remote object store only understands the file identifiers it issues,
//! so weedblob keeps a durable index from caller keys to `(size, file_id)`
//! records. This crate provides the record codec and the ordered,
//! transactional key-value stores the index lives in.
//!
//! # Key Types
//!
//! - [`IndexRecord`] -- the `(size, file_id)` value and its byte encoding
//! - [`IndexStore`] / [`IndexTxn`] -- the store interface consumed by the client
//! - [`InMemoryIndex`] -- `BTreeMap`-backed store for tests and embedding
//! - [`RedbIndex`] -- persistent store backed by redb
//!
//! # Design Rules
//!
//! 1. Keys are raw bytes ordered lexicographically; iteration follows that order.
//! 2. Readers never observe uncommitted writes.
//! 3. Write transactions are serialized by the store, not by its callers.
//! 4. A value that fails to decode is corruption, never absence.

pub mod error;
pub mod memory;
pub mod persistent;
pub mod record;
pub mod traits;

pub use error::{DecodeError, EncodeError, IndexError, IndexResult};
pub use memory::InMemoryIndex;
pub use persistent::RedbIndex;
pub use record::{IndexRecord, RECORD_VERSION};
pub use traits::{IndexCursor, IndexEntry, IndexStore, IndexTxn};
