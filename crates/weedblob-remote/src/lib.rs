//! Remote object store contract for weedblob.
//!
//! The remote store is fileID-addressed: it assigns an opaque identifier on
//! upload and needs that identifier for every later download or delete. It
//! cannot look objects up by the caller's key.
//!
//! # Backends
//!
//! All backends implement the [`RemoteStore`] trait:
//!
//! - [`WeedClient`] -- SeaweedFS master + volume servers over HTTP
//! - [`InMemoryRemoteStore`] -- `HashMap`-based store for tests and embedding

pub mod error;
pub mod memory;
pub mod traits;
pub mod weed;

pub use error::{RemoteError, RemoteResult};
pub use memory::{InMemoryRemoteStore, StoredBlob};
pub use traits::{BlobReader, RemoteStore, OCTET_STREAM};
pub use weed::WeedClient;
