//! Shared handler state.

use derive_getters::Getters;
use std::sync::Arc;
use std::time::Duration;
use tagvault_ingest::{CallContext, MediaService};
use tagvault_storage::{FileSystemBlobStore, TagStore};

/// State shared by all handlers. Cheap to clone.
#[derive(Clone, Getters, derive_builder::Builder)]
#[builder(pattern = "owned")]
pub struct AppState {
    /// Ingestion and retrieval.
    media: Arc<MediaService>,
    /// Tag vocabulary, for the tag routes.
    tags: Arc<dyn TagStore>,
    /// Blob store, for serving signed downloads.
    blobs: Arc<FileSystemBlobStore>,
    /// Deadline applied to each request's store calls.
    request_timeout: Duration,
    /// Largest accepted upload body in bytes.
    max_upload_bytes: usize,
}

impl AppState {
    /// Fresh call context for one request.
    pub fn call_context(&self) -> CallContext {
        CallContext::new().with_timeout(self.request_timeout)
    }
}
