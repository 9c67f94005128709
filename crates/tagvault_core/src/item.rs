//! Retrieval result items.

use crate::MediaMetadata;
use derive_getters::Getters;

/// A metadata record enriched with a time-limited access URL.
///
/// `file_url` is `None` when the blob store could not presign the record.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct MediaItem {
    metadata: MediaMetadata,
    file_url: Option<String>,
}

impl MediaItem {
    /// Pair a record with its access URL.
    pub fn new(metadata: MediaMetadata, file_url: Option<String>) -> Self {
        Self { metadata, file_url }
    }
}
