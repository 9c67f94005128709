//! Tag vocabulary entries.

use crate::TagId;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A named tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Serialize, Deserialize)]
pub struct Tag {
    id: TagId,
    name: String,
}

impl Tag {
    /// Create a tag entry.
    pub fn new(id: TagId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
