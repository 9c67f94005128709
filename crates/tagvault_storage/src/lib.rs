//! Store contracts and backends for Tagvault.
//!
//! The ingestion core talks to three stores, each behind a trait:
//!
//! - [`MetadataStore`]: metadata records, atomic upsert, lookup by checksum and tag,
//!   passive expiry of abandoned pending records
//! - [`BlobStore`]: content keyed by media id, presigned retrieval URLs
//! - [`TagStore`]: the tag vocabulary
//!
//! Every method returns errors already classified as [`MediaError`](tagvault_error::MediaError).
//!
//! # Backends
//!
//! - [`MemoryMetadataStore`] and [`MemoryTagStore`] keep everything in process memory
//! - [`FileMetadataStore`] and [`FileTagStore`] add a JSON snapshot on disk, rewritten
//!   atomically after every mutation and loaded again on open
//! - [`FileSystemBlobStore`] stores blobs content-addressed on disk and hands out
//!   HMAC signed URLs ([`UrlSigner`])
//! - [`MemoryBlobStore`] keeps blobs in memory, for tests and embedding
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use tagvault_storage::{MemoryMetadataStore, MemoryTagStore, TagStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tags = MemoryTagStore::new();
//! let metadata = MemoryMetadataStore::new(Duration::from_secs(60));
//!
//! let t1 = tags.create_tag("holiday").await?;
//! assert!(tags.all_exist(&[t1]).await?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod blob;
mod file_metadata;
mod file_tags;
mod filesystem;
mod memory_blob;
mod memory_metadata;
mod memory_tags;
mod metadata;
mod signer;
mod snapshot;
mod tags;

pub use blob::BlobStore;
pub use file_metadata::FileMetadataStore;
pub use file_tags::FileTagStore;
pub use filesystem::FileSystemBlobStore;
pub use memory_blob::MemoryBlobStore;
pub use memory_metadata::MemoryMetadataStore;
pub use memory_tags::{MemoryTagStore, tag_id_for_name};
pub use metadata::MetadataStore;
pub use signer::{BLOB_ROUTE_PREFIX, UrlSigner};
pub use tags::TagStore;
pub use tagvault_error::{StorageError, StorageErrorKind};
