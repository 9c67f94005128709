//! Tag vocabulary contract.

use tagvault_core::{Tag, TagId};
use tagvault_error::MediaResult;

/// The tag vocabulary.
#[async_trait::async_trait]
pub trait TagStore: Send + Sync {
    /// Create a tag, or return the id of the existing tag with this name.
    async fn create_tag(&self, name: &str) -> MediaResult<TagId>;

    /// Every known tag.
    async fn list_tags(&self) -> MediaResult<Vec<Tag>>;

    /// Remove the given tags. Unknown ids are ignored.
    async fn delete_tags(&self, ids: &[TagId]) -> MediaResult<()>;

    /// Whether every id in `ids` names a known tag. True for an empty list.
    async fn all_exist(&self, ids: &[TagId]) -> MediaResult<bool>;
}
