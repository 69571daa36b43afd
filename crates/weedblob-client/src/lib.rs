//! Key-addressed blob storage over SeaweedFS.
//!
//! SeaweedFS stores objects under file identifiers it assigns itself. This
//! crate lets callers use their own keys instead: it uploads content to the
//! remote store and keeps a local, transactional index from each key to the
//! `(size, file_id)` record the upload produced.
//!
//! # Key Types
//!
//! - [`Client`] -- Put, Get, Delete, Stat, List and Check over an index and a remote store
//! - [`Listing`] -- lazy, forward-only page over the index
//! - [`StorageConfig`] / [`open_storage`] -- build a client over a live master
//! - [`BlobStorage`] -- the interface a host framework consumes
//! - [`BlobHub`] -- optional sink for committed changes
//!
//! # Consistency
//!
//! The index and the remote store cannot be updated atomically. Each write
//! keeps the index transaction open across its single remote call, so an
//! early failure leaves both sides unchanged and a late one leaves a logged
//! orphan rather than a dangling key.

pub mod client;
pub mod config;
pub mod error;
pub mod listing;
pub mod notify;
pub mod storage;

pub use client::{Client, SizedKey};
pub use config::StorageConfig;
pub use error::{ClientError, ClientResult};
pub use listing::{ListedBlob, Listing};
pub use notify::{BlobEvent, BlobHub, NoOpHub, RecordingHub};
pub use storage::{open_storage, BlobStorage};
