//! Tagvault: content-addressed media ingestion with tag-based retrieval.
//!
//! A client uploads a file with a name and a set of tag ids. Tagvault derives a
//! deterministic media id from those three inputs, decides whether the upload
//! duplicates, conflicts with or reclaims an existing record, then persists
//! metadata and blob in an order that never exposes half-written media.
//! Retrieval by tag returns each item with a time-limited download URL.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::io::Cursor;
//! use std::sync::Arc;
//! use tagvault::{
//!     CallContext, MediaServiceBuilder, MemoryBlobStore, MemoryMetadataStore, MemoryTagStore,
//!     TagStore,
//! };
//!
//! # async fn run() -> tagvault::TagvaultResult<()> {
//! let tags = Arc::new(MemoryTagStore::new());
//! let service = MediaServiceBuilder::default()
//!     .tags(tags.clone())
//!     .metadata(Arc::new(MemoryMetadataStore::default()))
//!     .blobs(Arc::new(MemoryBlobStore::new()))
//!     .build()?;
//!
//! let holiday = tags.create_tag("holiday").await?;
//! let ctx = CallContext::new();
//! let id = service
//!     .create_media(&ctx, "beach.jpg", vec![holiday.clone()], &mut Cursor::new(b"ABC".to_vec()))
//!     .await?;
//! let items = service.find_by_tag(&ctx, &holiday).await?;
//! assert_eq!(items.len(), 1);
//! # let _ = id;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `tagvault_error` - error taxonomy
//! - `tagvault_core` - data model, content identity, dedup decisions
//! - `tagvault_storage` - store contracts and implementations
//! - `tagvault_ingest` - ingestion orchestrator and retrieval assembler
//! - `tagvault_server` - HTTP API and configuration
//!
//! This crate re-exports everything for convenience and hosts the `tagvault`
//! binary.

#![forbid(unsafe_code)]

pub use tagvault_core::*;
pub use tagvault_error::*;
pub use tagvault_ingest::*;
pub use tagvault_server::*;
pub use tagvault_storage::*;

mod logging;

pub use logging::{LogFormat, init_logging};
