//! Metadata store contract.

use tagvault_core::{MediaId, MediaMetadata, TagId};
use tagvault_error::MediaResult;

/// Persistence for media metadata records.
///
/// Implementations must:
/// - apply [`upsert`](Self::upsert) atomically and only acknowledge it once durable
///   (concurrent identical uploads rely on it as their only arbitration point)
/// - purge pending records whose `last_update` is older than the configured
///   lifetime on their own, without the caller sweeping
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert `record`, or replace the record with the same id.
    async fn upsert(&self, record: &MediaMetadata) -> MediaResult<()>;

    /// Load a record by id.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if no record has this id.
    async fn get(&self, id: &MediaId) -> MediaResult<MediaMetadata>;

    /// Set the completion flag and refresh `last_update`.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if no record has this id.
    async fn set_upload_complete(&self, id: &MediaId, complete: bool) -> MediaResult<()>;

    /// All records carrying `tag_id`.
    async fn find_by_tag_id(&self, tag_id: &TagId) -> MediaResult<Vec<MediaMetadata>>;

    /// A record with this content checksum, if any.
    async fn find_by_checksum(&self, checksum: &str) -> MediaResult<Option<MediaMetadata>>;

    /// Remove the given records. Unknown ids are ignored.
    async fn delete_all(&self, ids: &[MediaId]) -> MediaResult<()>;
}
