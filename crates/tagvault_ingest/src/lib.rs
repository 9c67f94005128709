//! Ingestion orchestrator and retrieval assembler for Tagvault.
//!
//! [`MediaService`] ties the content identity derivation and dedup decision of
//! `tagvault_core` to the stores of `tagvault_storage`:
//!
//! - [`MediaService::create_media`] runs the two phase write: pending metadata,
//!   then blob, then completion flag
//! - [`MediaService::find_by_tag`] loads records by tag and attaches presigned URLs
//!
//! Every store call runs under a [`CallContext`], which carries the request's
//! deadline and cancellation signal.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod service;

pub use config::{
    DEFAULT_INCOMPLETE_METADATA_LIFETIME, DEFAULT_MEDIA_URL_LIFETIME, MediaServiceConfig,
    MediaServiceConfigBuilder,
};
pub use context::{CallContext, CancelHandle};
pub use service::{MediaService, MediaServiceBuilder};
