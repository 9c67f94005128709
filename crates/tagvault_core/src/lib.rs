//! Core data types for the Tagvault media service.
//!
//! This crate holds everything about ingestion that does not perform store I/O:
//!
//! - **Data model**: [`MediaMetadata`], [`MediaItem`], [`Tag`] and their ids
//! - **Content identity**: streaming checksum and deterministic [`MediaId`] derivation
//! - **Dedup decisions**: the pure [`decide`] function the orchestrator consults
//!   before writing anything

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dedup;
mod identity;
mod ids;
mod item;
mod metadata;
mod tag;

pub use dedup::{ConflictReason, DedupDecision, decide, is_stale, tag_sets_equal};
pub use identity::{
    CHECKSUM_CHUNK_SIZE, ContentIdentity, MediaSource, canonical_tag_ids, compute_checksum,
    derive_identity, derive_media_id,
};
pub use ids::{MediaId, TagId};
pub use item::MediaItem;
pub use metadata::{MediaMetadata, MediaMetadataBuilder};
pub use tag::Tag;
