//! In-memory tag vocabulary.

use crate::TagStore;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tagvault_core::{Tag, TagId};
use tagvault_error::MediaResult;
use tokio::sync::RwLock;

/// Id of the tag called `name`: hex SHA-256 of the name.
///
/// Creating the same name twice therefore always yields the same id.
pub fn tag_id_for_name(name: &str) -> TagId {
    TagId::new(format!("{:x}", Sha256::digest(name.as_bytes())))
}

/// In-memory tag store.
///
/// Cloning is cheap and clones share the same vocabulary.
#[derive(Debug, Clone, Default)]
pub struct MemoryTagStore {
    tags: Arc<RwLock<BTreeMap<TagId, Tag>>>,
}

impl MemoryTagStore {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vocabulary holding `tags`.
    pub fn from_tags(tags: impl IntoIterator<Item = Tag>) -> Self {
        let tags = tags.into_iter().map(|tag| (tag.id().clone(), tag)).collect();
        Self {
            tags: Arc::new(RwLock::new(tags)),
        }
    }
}

#[async_trait::async_trait]
impl TagStore for MemoryTagStore {
    #[tracing::instrument(skip(self))]
    async fn create_tag(&self, name: &str) -> MediaResult<TagId> {
        let id = tag_id_for_name(name);
        let mut tags = self.tags.write().await;
        tags.entry(id.clone()).or_insert_with(|| {
            tracing::info!(tag_id = %id, "Created tag");
            Tag::new(id.clone(), name)
        });
        Ok(id)
    }

    async fn list_tags(&self) -> MediaResult<Vec<Tag>> {
        let tags = self.tags.read().await;
        let mut listed: Vec<Tag> = tags.values().cloned().collect();
        listed.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(listed)
    }

    #[tracing::instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_tags(&self, ids: &[TagId]) -> MediaResult<()> {
        let mut tags = self.tags.write().await;
        for id in ids {
            tags.remove(id);
        }
        Ok(())
    }

    async fn all_exist(&self, ids: &[TagId]) -> MediaResult<bool> {
        let tags = self.tags.read().await;
        Ok(ids.iter().all(|id| tags.contains_key(id)))
    }
}
