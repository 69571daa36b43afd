use std::io::Read;
use std::sync::Arc;

use tracing::info;
use weedblob_index::RedbIndex;
use weedblob_remote::{BlobReader, WeedClient};

use crate::client::Client;
use crate::config::StorageConfig;
use crate::error::{ClientError, ClientResult};
use crate::listing::ListedBlob;

/// Blob storage as seen by a host framework.
///
/// Keys are opaque strings. Implementations must satisfy:
/// - A successful `put` makes the key visible to `get`, `stat` and `list`.
/// - A successful `delete` makes the key invisible to all three.
/// - `list` returns keys in ascending byte order, strictly after `after`.
pub trait BlobStorage: Send + Sync {
    /// Store `content` under `key` with the declared `size`.
    fn put(&self, key: &str, size: u64, content: &mut dyn Read) -> ClientResult<()>;

    /// Open the content under `key` together with its recorded size.
    fn get(&self, key: &str) -> ClientResult<(BlobReader, u64)>;

    /// Remove `key` and its content.
    fn delete(&self, key: &str) -> ClientResult<()>;

    /// The recorded size of `key`.
    fn stat(&self, key: &str) -> ClientResult<u64>;

    /// One page of at most `limit` records after `after`.
    fn list(&self, after: &str, limit: usize) -> ClientResult<Vec<ListedBlob>>;

    /// Verify the backing store is reachable.
    fn check(&self) -> ClientResult<()>;
}

impl BlobStorage for Client {
    fn put(&self, key: &str, size: u64, content: &mut dyn Read) -> ClientResult<()> {
        Client::put(self, key, size, content)
    }

    fn get(&self, key: &str) -> ClientResult<(BlobReader, u64)> {
        Client::get(self, key)
    }

    fn delete(&self, key: &str) -> ClientResult<()> {
        Client::delete(self, key)
    }

    fn stat(&self, key: &str) -> ClientResult<u64> {
        Client::stat(self, key)
    }

    fn list(&self, after: &str, limit: usize) -> ClientResult<Vec<ListedBlob>> {
        Client::list(self, after, limit)
    }

    fn check(&self) -> ClientResult<()> {
        Client::check(self)
    }
}

/// Open a [`Client`] over a SeaweedFS master and an on-disk index.
///
/// Both settings are validated before any file or network access. The index
/// directory is created if needed, the per-master index file is opened or
/// created, and the master is probed once.
pub fn open_storage(config: &StorageConfig) -> ClientResult<Client> {
    config.validate()?;
    let master_url = config.master_url()?;
    let db_dir = config.db_dir()?;

    std::fs::create_dir_all(db_dir)?;
    let path = config.index_path()?;
    let index = RedbIndex::open_or_create(&path).map_err(|e| {
        ClientError::Index {
            op: "open",
            key: String::new(),
            source: e,
        }
    })?;

    let remote = WeedClient::new(master_url);
    let client = Client::new(Arc::new(index), Arc::new(remote));
    client.check()?;

    info!(master = master_url, index = %path.display(), "opened blob storage");
    Ok(client)
}
