//! The [`Client`]: key-addressed blob operations over a fileID store.
//!
//! Each operation makes at most one index transaction and at most one remote
//! call, ordered so that a failure leaves the less harmful kind of orphan:
//!
//! - **Put** opens the transaction, uploads, records, commits. A failed
//!   upload leaves no record; a failed commit leaves an unreferenced remote
//!   object.
//! - **Delete** opens the transaction, stages the record removal, deletes
//!   remotely, commits. A failed remote delete rolls the record back; a
//!   failed commit leaves a record whose object is gone.
//!
//! Orphans are logged, never repaired here. Nothing is retried.

use std::io::Read;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};
use weedblob_index::{IndexRecord, IndexStore, IndexTxn};
use weedblob_remote::{BlobReader, RemoteError, RemoteStore, OCTET_STREAM};

use crate::error::{ClientError, ClientResult};
use crate::listing::{ListedBlob, Listing};
use crate::notify::{BlobEvent, BlobHub, NoOpHub};

/// A key paired with the size recorded for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SizedKey {
    pub key: String,
    pub size: u64,
}

/// Key-addressed blob store over a remote fileID store and a local index.
///
/// `Client` is `Send + Sync`; share it behind an `Arc` for concurrent use.
/// It adds no locking of its own and relies on the index's transactions.
pub struct Client {
    index: Arc<dyn IndexStore>,
    remote: Arc<dyn RemoteStore>,
    hub: Arc<dyn BlobHub>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client over the given index and remote store.
    pub fn new(index: Arc<dyn IndexStore>, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            index,
            remote,
            hub: Arc::new(NoOpHub),
        }
    }

    /// Attach a hub notified after every committed Put and Delete.
    pub fn with_hub(mut self, hub: Arc<dyn BlobHub>) -> Self {
        self.hub = hub;
        self
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    /// Store `content` under `key` with the declared `size`.
    ///
    /// Fails with [`ClientError::AlreadyExists`] if `key` already has a
    /// record; replace a blob by deleting it first. If recording fails after
    /// a successful upload, the uploaded object is left behind in the remote
    /// store.
    pub fn put(&self, key: &str, size: u64, content: &mut dyn Read) -> ClientResult<()> {
        let mut txn = self
            .index
            .begin()
            .map_err(|e| ClientError::transaction("put", key, e))?;

        // Write transactions are serialized, so no other Put can record this
        // key between the check and the commit.
        match self.index.get(key.as_bytes()) {
            Ok(None) => {}
            Ok(Some(_)) => {
                rollback(txn, "put", key);
                return Err(ClientError::AlreadyExists {
                    key: key.to_string(),
                });
            }
            Err(e) => {
                rollback(txn, "put", key);
                return Err(ClientError::index("put", key, e));
            }
        }

        let file_id = match self.remote.upload(key, OCTET_STREAM, content) {
            Ok(fid) if !fid.is_empty() => fid,
            Ok(_) => {
                rollback(txn, "put", key);
                let e = RemoteError::Protocol("upload returned an empty file id".into());
                return Err(ClientError::remote("put", key, e));
            }
            Err(e) => {
                rollback(txn, "put", key);
                return Err(ClientError::remote("put", key, e));
            }
        };

        let value = match IndexRecord::new(file_id.as_str(), size).encode() {
            Ok(value) => value,
            Err(source) => {
                rollback(txn, "put", key);
                warn!(key, fid = %file_id, "remote object orphaned: record encoding failed");
                return Err(ClientError::Encode {
                    op: "put",
                    key: key.to_string(),
                    source,
                });
            }
        };

        if let Err(e) = txn.set(key.as_bytes(), &value) {
            rollback(txn, "put", key);
            warn!(key, fid = %file_id, error = %e, "remote object orphaned: index write failed");
            return Err(ClientError::index("put", key, e));
        }

        if let Err(e) = txn.commit() {
            warn!(key, fid = %file_id, error = %e, "remote object orphaned: index commit failed");
            return Err(ClientError::transaction("put", key, e));
        }

        debug!(key, fid = %file_id, size, "stored blob");
        self.hub.notify(&BlobEvent::Stored {
            key: key.to_string(),
            size,
        });
        Ok(())
    }

    /// Remove `key` from the index and its object from the remote store.
    ///
    /// If the remote delete fails the index record is kept, so the key still
    /// points at content that still exists.
    pub fn delete(&self, key: &str) -> ClientResult<()> {
        let record = self.lookup("delete", key)?;

        let mut txn = self
            .index
            .begin()
            .map_err(|e| ClientError::transaction("delete", key, e))?;

        if let Err(e) = txn.delete(key.as_bytes()) {
            rollback(txn, "delete", key);
            return Err(ClientError::index("delete", key, e));
        }

        if let Err(e) = self.remote.delete(&record.file_id) {
            rollback(txn, "delete", key);
            return Err(ClientError::remote("delete", key, e));
        }

        if let Err(e) = txn.commit() {
            warn!(
                key,
                fid = %record.file_id,
                error = %e,
                "index record orphaned: remote object deleted but commit failed"
            );
            return Err(ClientError::transaction("delete", key, e));
        }

        debug!(key, fid = %record.file_id, "deleted blob");
        self.hub.notify(&BlobEvent::Removed {
            key: key.to_string(),
        });
        Ok(())
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    /// Open the content stored under `key`, with its recorded size.
    pub fn get(&self, key: &str) -> ClientResult<(BlobReader, u64)> {
        let record = self.lookup("get", key)?;
        let reader = self
            .remote
            .download(&record.file_id)
            .map_err(|e| ClientError::remote("get", key, e))?;
        Ok((reader, record.size))
    }

    /// The recorded size of `key`. Never contacts the remote store.
    pub fn stat(&self, key: &str) -> ClientResult<u64> {
        self.lookup("stat", key).map(|record| record.size)
    }

    /// Stat each key in turn, returning the ones that resolved.
    ///
    /// A key that fails to resolve is skipped and logged rather than
    /// failing the batch. Probes run sequentially in input order.
    pub fn stat_blobs<S: AsRef<str>>(&self, keys: &[S]) -> Vec<SizedKey> {
        let mut found = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            match self.stat(key) {
                Ok(size) => found.push(SizedKey {
                    key: key.to_string(),
                    size,
                }),
                Err(e) => warn!(key, error = %e, "stat failed; skipping key"),
            }
        }
        found
    }

    /// Lazily enumerate up to `limit` records with keys strictly after `after`.
    ///
    /// An empty `after` starts at the first key.
    pub fn listing(&self, after: &str, limit: usize) -> ClientResult<Listing<'_>> {
        let cursor = self
            .index
            .seek(after.as_bytes())
            .map_err(|e| ClientError::index("list", after, e))?;
        Ok(Listing::new(cursor, after, limit))
    }

    /// Collect one page of up to `limit` records with keys strictly after `after`.
    ///
    /// Fails as a whole if any record on the page cannot be read.
    pub fn list(&self, after: &str, limit: usize) -> ClientResult<Vec<ListedBlob>> {
        self.listing(after, limit)?.collect()
    }

    /// Probe the remote store. Does not touch the index.
    pub fn check(&self) -> ClientResult<()> {
        self.remote
            .status()
            .map_err(|e| ClientError::remote("check", "", e))
    }

    fn lookup(&self, op: &'static str, key: &str) -> ClientResult<IndexRecord> {
        let value = self
            .index
            .get(key.as_bytes())
            .map_err(|e| ClientError::index(op, key, e))?
            .ok_or_else(|| ClientError::NotFound {
                key: key.to_string(),
            })?;
        IndexRecord::decode(&value).map_err(|e| ClientError::corrupt(key, e))
    }
}

/// Roll back `txn`, logging (not returning) a failure so the caller can
/// report the error that caused the rollback.
fn rollback(txn: Box<dyn IndexTxn + '_>, op: &'static str, key: &str) {
    if let Err(e) = txn.rollback() {
        error!(op, key, error = %e, "index rollback failed");
    }
}
