//! In-memory remote store for testing and embedding.
//!
//! [`InMemoryRemoteStore`] hands out SeaweedFS-shaped file ids
//! (`volume,needle`) and keeps object bytes in a `HashMap` behind a
//! `RwLock`. It can be switched offline to simulate an unreachable store.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::{BlobReader, RemoteStore};

/// An object held by [`InMemoryRemoteStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    /// File name supplied at upload.
    pub name: String,
    /// Content type supplied at upload.
    pub content_type: String,
    /// Object bytes.
    pub data: Vec<u8>,
}

/// An in-memory implementation of [`RemoteStore`].
#[derive(Debug)]
pub struct InMemoryRemoteStore {
    objects: RwLock<HashMap<String, StoredBlob>>,
    next_needle: AtomicU64,
    online: AtomicBool,
}

impl InMemoryRemoteStore {
    /// Create a new empty, reachable store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            next_needle: AtomicU64::new(1),
            online: AtomicBool::new(true),
        }
    }

    /// Simulate the store going down (`false`) or coming back (`true`).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Returns `true` if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if an object exists under `file_id`.
    pub fn contains(&self, file_id: &str) -> bool {
        self.objects
            .read()
            .map(|map| map.contains_key(file_id))
            .unwrap_or(false)
    }

    /// A copy of the object stored under `file_id`, if any.
    pub fn object(&self, file_id: &str) -> Option<StoredBlob> {
        self.objects
            .read()
            .ok()
            .and_then(|map| map.get(file_id).cloned())
    }

    fn ensure_online(&self) -> RemoteResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("in-memory store is offline".into()))
        }
    }

    fn poisoned(e: impl std::fmt::Display) -> RemoteError {
        RemoteError::Protocol(format!("lock poisoned: {e}"))
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn upload(
        &self,
        key_hint: &str,
        content_type: &str,
        content: &mut dyn Read,
    ) -> RemoteResult<String> {
        self.ensure_online()?;
        let mut data = Vec::new();
        content.read_to_end(&mut data)?;

        let needle = self.next_needle.fetch_add(1, Ordering::SeqCst);
        let file_id = format!("1,{needle:08x}");
        let blob = StoredBlob {
            name: key_hint.to_string(),
            content_type: content_type.to_string(),
            data,
        };
        self.objects
            .write()
            .map_err(Self::poisoned)?
            .insert(file_id.clone(), blob);
        Ok(file_id)
    }

    fn download(&self, file_id: &str) -> RemoteResult<BlobReader> {
        self.ensure_online()?;
        let map = self.objects.read().map_err(Self::poisoned)?;
        let blob = map
            .get(file_id)
            .ok_or_else(|| RemoteError::NotFound(file_id.to_string()))?;
        Ok(Box::new(Cursor::new(blob.data.clone())))
    }

    fn delete(&self, file_id: &str) -> RemoteResult<()> {
        self.ensure_online()?;
        let mut map = self.objects.write().map_err(Self::poisoned)?;
        map.remove(file_id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(file_id.to_string()))
    }

    fn status(&self) -> RemoteResult<()> {
        self.ensure_online()
    }
}
