//! Blob store contract.

use std::time::Duration;
use tagvault_core::MediaSource;
use tagvault_error::MediaResult;

/// Durable key to bytes storage.
///
/// Writing the same key twice with the same bytes must be harmless, as concurrent
/// identical uploads may both reach the blob write.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Stream `source` from its current position into the blob at `key`.
    async fn put(&self, key: &str, source: &mut dyn MediaSource) -> MediaResult<()>;

    /// A credential-free URL granting read access to `key` for `lifetime`.
    async fn presign_get(&self, key: &str, lifetime: Duration) -> MediaResult<String>;

    /// Remove the given blobs. Missing keys are ignored.
    async fn delete_all(&self, keys: &[String]) -> MediaResult<()>;
}
