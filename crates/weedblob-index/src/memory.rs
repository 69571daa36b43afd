//! In-memory index for testing and embedding.
//!
//! [`InMemoryIndex`] keeps committed entries in a `BTreeMap` behind a
//! `RwLock`. Write transactions stage their changes privately and hold a
//! writer mutex until they finish, so only one transaction is open at a time.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard, RwLock};

use crate::error::{IndexError, IndexResult};
use crate::traits::{IndexCursor, IndexEntry, IndexStore, IndexTxn};

/// An in-memory implementation of [`IndexStore`].
///
/// Data is lost when the index is dropped.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    writer: Mutex<()>,
}

impl InMemoryIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Returns `true` if no entries are committed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_entries(&self) -> IndexResult<std::sync::RwLockReadGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>> {
        self.entries
            .read()
            .map_err(|e| IndexError::Poisoned(e.to_string()))
    }
}

impl IndexStore for InMemoryIndex {
    fn get(&self, key: &[u8]) -> IndexResult<Option<Vec<u8>>> {
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn begin(&self) -> IndexResult<Box<dyn IndexTxn + '_>> {
        let guard = self
            .writer
            .lock()
            .map_err(|e| IndexError::Transaction(format!("writer lock poisoned: {e}")))?;
        Ok(Box::new(InMemoryTxn {
            index: self,
            staged: BTreeMap::new(),
            _writer: guard,
        }))
    }

    fn seek(&self, key: &[u8]) -> IndexResult<IndexCursor<'_>> {
        Ok(Box::new(InMemoryCursor {
            index: self,
            next: Bound::Included(key.to_vec()),
            done: false,
        }))
    }
}

/// Staged writes: `Some(value)` to set, `None` to delete.
struct InMemoryTxn<'a> {
    index: &'a InMemoryIndex,
    staged: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    _writer: MutexGuard<'a, ()>,
}

impl IndexTxn for InMemoryTxn<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> IndexResult<()> {
        self.staged.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> IndexResult<()> {
        self.staged.insert(key.to_vec(), None);
        Ok(())
    }

    fn commit(self: Box<Self>) -> IndexResult<()> {
        let mut map = self
            .index
            .entries
            .write()
            .map_err(|e| IndexError::Poisoned(e.to_string()))?;
        for (key, change) in self.staged {
            match change {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn rollback(self: Box<Self>) -> IndexResult<()> {
        Ok(())
    }
}

/// Cursor that re-reads the committed map one entry at a time, so it never
/// holds the read lock between calls to `next`.
struct InMemoryCursor<'a> {
    index: &'a InMemoryIndex,
    next: Bound<Vec<u8>>,
    done: bool,
}

impl Iterator for InMemoryCursor<'_> {
    type Item = IndexResult<IndexEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let map = match self.index.read_entries() {
            Ok(map) => map,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let entry = map
            .range::<Vec<u8>, _>((self.next.clone(), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()));
        drop(map);

        match entry {
            Some((key, value)) => {
                self.next = Bound::Excluded(key.clone());
                Some(Ok((key, value)))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}
