//! redb-backed persistent index.
//!
//! [`RedbIndex`] stores every record in a single redb table keyed by the raw
//! caller key bytes, so redb's key ordering is the listing order.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use redb::{Database, ReadTransaction, TableDefinition, WriteTransaction};
use tracing::{debug, info};

use crate::error::{IndexError, IndexResult};
use crate::traits::{IndexCursor, IndexEntry, IndexStore, IndexTxn};

/// Table definition for index records.
/// Key: caller key bytes
/// Value: encoded [`IndexRecord`](crate::IndexRecord)
const RECORDS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("records");

/// Entries fetched per refill of a [`RedbCursor`].
const CURSOR_BATCH: usize = 256;

/// redb-based persistent index.
///
/// ACID, single writer, concurrent readers. Readers see only committed data.
pub struct RedbIndex {
    path: PathBuf,
    db: Database,
}

impl RedbIndex {
    /// Open the index at `path`, creating it if the file does not exist.
    ///
    /// Only a "file not found" failure triggers creation. Any other fault
    /// (permissions, a corrupt file, a database already held open) is
    /// returned unchanged rather than papered over by a fresh database.
    pub fn open_or_create(path: impl AsRef<Path>) -> IndexResult<Self> {
        let path = path.as_ref();
        let db = match Database::open(path) {
            Ok(db) => {
                debug!(path = %path.display(), "opened existing index");
                db
            }
            Err(err) if is_not_found(&err) => {
                info!(path = %path.display(), "index not found; creating");
                Database::create(path).map_err(|e| open_error(path, e))?
            }
            Err(err) => return Err(open_error(path, err)),
        };

        // Ensure the records table exists so readers never race its creation.
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(RECORDS_TABLE)?;
        }
        txn.commit()?;

        Ok(Self {
            path: path.to_path_buf(),
            db,
        })
    }

    /// Filesystem location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_not_found(err: &redb::DatabaseError) -> bool {
    matches!(
        err,
        redb::DatabaseError::Storage(redb::StorageError::Io(io))
            if io.kind() == io::ErrorKind::NotFound
    )
}

fn open_error(path: &Path, err: redb::DatabaseError) -> IndexError {
    IndexError::Open {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

impl std::fmt::Debug for RedbIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbIndex")
            .field("path", &self.path)
            .finish()
    }
}

impl IndexStore for RedbIndex {
    fn get(&self, key: &[u8]) -> IndexResult<Option<Vec<u8>>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(RECORDS_TABLE)?;
        let value = table.get(key)?.map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn begin(&self) -> IndexResult<Box<dyn IndexTxn + '_>> {
        let txn = self.db.begin_write()?;
        Ok(Box::new(RedbTxn { txn }))
    }

    fn seek(&self, key: &[u8]) -> IndexResult<IndexCursor<'_>> {
        let txn = self.db.begin_read()?;
        Ok(Box::new(RedbCursor {
            txn,
            from: key.to_vec(),
            inclusive: true,
            buffer: VecDeque::new(),
            exhausted: false,
        }))
    }
}

struct RedbTxn {
    txn: WriteTransaction,
}

impl IndexTxn for RedbTxn {
    fn set(&mut self, key: &[u8], value: &[u8]) -> IndexResult<()> {
        let mut table = self.txn.open_table(RECORDS_TABLE)?;
        table.insert(key, value)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> IndexResult<()> {
        let mut table = self.txn.open_table(RECORDS_TABLE)?;
        table.remove(key)?;
        Ok(())
    }

    fn commit(self: Box<Self>) -> IndexResult<()> {
        self.txn.commit()?;
        Ok(())
    }

    fn rollback(self: Box<Self>) -> IndexResult<()> {
        self.txn
            .abort()
            .map_err(|e| IndexError::Transaction(e.to_string()))
    }
}

/// Forward cursor over a read snapshot, refilled in batches.
struct RedbCursor {
    txn: ReadTransaction,
    /// Key the next batch starts from.
    from: Vec<u8>,
    /// Whether `from` itself may be returned.
    inclusive: bool,
    buffer: VecDeque<IndexEntry>,
    exhausted: bool,
}

impl RedbCursor {
    fn refill(&mut self) -> IndexResult<()> {
        let table = self.txn.open_table(RECORDS_TABLE)?;
        let range = table.range::<&[u8]>(self.from.as_slice()..)?;
        for item in range {
            let (key, value) = item?;
            let key = key.value();
            if !self.inclusive && key == self.from.as_slice() {
                continue;
            }
            self.buffer.push_back((key.to_vec(), value.value().to_vec()));
            if self.buffer.len() == CURSOR_BATCH {
                break;
            }
        }

        match self.buffer.back() {
            Some((last, _)) if self.buffer.len() == CURSOR_BATCH => {
                self.from = last.clone();
                self.inclusive = false;
            }
            _ => self.exhausted = true,
        }
        Ok(())
    }
}

impl Iterator for RedbCursor {
    type Item = IndexResult<IndexEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.refill() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn put(index: &RedbIndex, key: &[u8], value: &[u8]) {
        let mut txn = index.begin().unwrap();
        txn.set(key, value).unwrap();
        txn.commit().unwrap();
    }

    #[test]
    fn open_or_create_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.redb");
        assert!(!path.exists());

        let index = RedbIndex::open_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(index.path(), path.as_path());
        assert!(index.get(b"anything").unwrap().is_none());
    }

    #[test]
    fn reopen_preserves_committed_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.redb");
        {
            let index = RedbIndex::open_or_create(&path).unwrap();
            put(&index, b"k", b"v");
        }
        let index = RedbIndex::open_or_create(&path).unwrap();
        assert_eq!(index.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn missing_parent_directory_is_not_created() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("index.redb");
        let err = RedbIndex::open_or_create(&path).unwrap_err();
        assert!(matches!(err, IndexError::Open { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn garbage_file_is_not_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.redb");
        std::fs::write(&path, b"definitely not a redb file").unwrap();

        let err = RedbIndex::open_or_create(&path).unwrap_err();
        assert!(matches!(err, IndexError::Open { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"definitely not a redb file");
    }

    #[test]
    fn rollback_restores_previous_state() {
        let dir = tempdir().unwrap();
        let index = RedbIndex::open_or_create(dir.path().join("index.redb")).unwrap();
        put(&index, b"k", b"v");

        let mut txn = index.begin().unwrap();
        txn.delete(b"k").unwrap();
        txn.set(b"other", b"x").unwrap();
        txn.rollback().unwrap();

        assert_eq!(index.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert!(index.get(b"other").unwrap().is_none());
    }

    #[test]
    fn seek_spans_multiple_batches_in_order() {
        let dir = tempdir().unwrap();
        let index = RedbIndex::open_or_create(dir.path().join("index.redb")).unwrap();

        let mut txn = index.begin().unwrap();
        let total = CURSOR_BATCH * 2 + 17;
        for i in 0..total {
            txn.set(format!("key-{i:05}").as_bytes(), b"v").unwrap();
        }
        txn.commit().unwrap();

        let keys: Vec<Vec<u8>> = index
            .seek(b"")
            .unwrap()
            .map(|entry| entry.unwrap().0)
            .collect();
        assert_eq!(keys.len(), total);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn seek_starts_at_first_key_not_less_than_target() {
        let dir = tempdir().unwrap();
        let index = RedbIndex::open_or_create(dir.path().join("index.redb")).unwrap();
        for key in [b"a", b"b", b"c"] {
            put(&index, key, b"v");
        }
        let keys: Vec<Vec<u8>> = index
            .seek(b"b")
            .unwrap()
            .map(|entry| entry.unwrap().0)
            .collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"c".to_vec()]);
    }
}
