//! Service tuning.

use derive_getters::Getters;
use std::time::Duration;

/// Default validity of presigned retrieval URLs.
pub const DEFAULT_MEDIA_URL_LIFETIME: Duration = Duration::from_secs(15 * 60);

/// Default time after which a pending upload counts as abandoned.
pub const DEFAULT_INCOMPLETE_METADATA_LIFETIME: Duration = Duration::from_secs(60);

/// Lifetimes the media service works with.
///
/// The incomplete metadata lifetime must match the one the metadata store expires
/// pending records with, otherwise the service may reclaim records the store
/// still considers live (or the reverse).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct MediaServiceConfig {
    /// Validity of presigned URLs handed out by retrieval.
    #[builder(default = "DEFAULT_MEDIA_URL_LIFETIME")]
    media_url_lifetime: Duration,
    /// Age after which a pending record may be reclaimed by a new upload.
    #[builder(default = "DEFAULT_INCOMPLETE_METADATA_LIFETIME")]
    incomplete_metadata_lifetime: Duration,
}

impl Default for MediaServiceConfig {
    fn default() -> Self {
        Self {
            media_url_lifetime: DEFAULT_MEDIA_URL_LIFETIME,
            incomplete_metadata_lifetime: DEFAULT_INCOMPLETE_METADATA_LIFETIME,
        }
    }
}
