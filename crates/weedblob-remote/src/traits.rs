//! The [`RemoteStore`] trait defining the object store interface.

use std::io::Read;

use crate::error::RemoteResult;

/// Content type used for blob uploads: the content is opaque bytes.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A readable stream of object content.
pub type BlobReader = Box<dyn Read + Send>;

/// A fileID-addressed object store.
///
/// The store assigns an opaque file id on upload; that id is the only handle
/// for later downloads and deletes. Every call is a single, independent
/// request: implementations neither retry nor batch.
pub trait RemoteStore: Send + Sync {
    /// Upload `content` and return the file id the store assigned.
    ///
    /// `key_hint` is advisory (used as the stored file name); the store does
    /// not index by it.
    fn upload(
        &self,
        key_hint: &str,
        content_type: &str,
        content: &mut dyn Read,
    ) -> RemoteResult<String>;

    /// Open a stream over the object stored under `file_id`.
    fn download(&self, file_id: &str) -> RemoteResult<BlobReader>;

    /// Delete the object stored under `file_id`.
    fn delete(&self, file_id: &str) -> RemoteResult<()>;

    /// Liveness probe. `Ok(())` means the store is reachable and healthy.
    fn status(&self) -> RemoteResult<()>;
}
