//! Media metadata records.

use crate::{ContentIdentity, MediaId, TagId};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Metadata record of one ingested media asset.
///
/// Created pending by the orchestrator, flipped to complete exactly once after
/// the blob write succeeded. Pending records whose `last_update` falls behind the
/// configured lifetime are removed by the metadata store's own expiry.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use tagvault_core::{MediaMetadataBuilder, TagId};
///
/// let record = MediaMetadataBuilder::default()
///     .id("f00d")
///     .name("pic1")
///     .tag_ids(vec![TagId::from("t1")])
///     .checksum("beef")
///     .last_update(Utc::now())
///     .build()
///     .unwrap();
///
/// assert!(!record.upload_complete());
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct MediaMetadata {
    /// Derived from `(name, tag_ids, checksum)`.
    id: MediaId,
    /// Display name chosen by the uploader.
    name: String,
    /// Tags attached at creation time.
    #[builder(default)]
    tag_ids: Vec<TagId>,
    /// Hex SHA-256 of the uploaded bytes.
    checksum: String,
    /// Set once the blob write finished.
    #[builder(default)]
    #[getter(skip)]
    upload_complete: bool,
    /// Refreshed on every write of the record.
    last_update: DateTime<Utc>,
}

impl MediaMetadata {
    /// Fresh pending record for newly hashed content.
    pub fn pending(
        identity: ContentIdentity,
        name: impl Into<String>,
        tag_ids: Vec<TagId>,
        now: DateTime<Utc>,
    ) -> Self {
        let ContentIdentity { media_id, checksum } = identity;
        Self {
            id: media_id,
            name: name.into(),
            tag_ids,
            checksum,
            upload_complete: false,
            last_update: now,
        }
    }

    /// Whether the blob belonging to this record has been fully written.
    pub fn upload_complete(&self) -> bool {
        self.upload_complete
    }

    /// Record a completion flag write at `at`.
    ///
    /// Completion is monotonic: once complete, a record never becomes pending again.
    pub fn set_upload_complete(&mut self, complete: bool, at: DateTime<Utc>) {
        self.upload_complete = self.upload_complete || complete;
        self.last_update = at;
    }
}
