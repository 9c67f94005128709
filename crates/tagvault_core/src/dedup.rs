//! Duplicate detection for uploads.
//!
//! [`decide`] is a pure function over the candidate record and whatever record the
//! metadata store returned for the candidate's checksum. It performs no I/O so the
//! orchestrator can consult it between the lookup and the first write.

use crate::{MediaId, MediaMetadata, TagId};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tagvault_error::MediaError;

/// What the orchestrator should do with a candidate upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    /// No record shares the checksum. Ingest as new.
    Proceed,
    /// A pending record shares the checksum but its upload was abandoned.
    /// Ingest, treating the stale record as reclaimable.
    ProceedOverwrite(MediaId),
    /// A complete record with the same content and labels exists. Return its id
    /// without writing anything.
    ReuseExisting(MediaId),
    /// The checksum is taken by conflicting labels, or another upload of the
    /// same content is still running.
    RejectConflict {
        /// Record the candidate collided with.
        existing_id: MediaId,
        /// Why the candidate was rejected.
        reason: ConflictReason,
    },
}

impl DedupDecision {
    /// Whether the orchestrator must go on to write metadata and blob.
    pub fn proceeds(&self) -> bool {
        matches!(self, Self::Proceed | Self::ProceedOverwrite(_))
    }
}

/// Why an upload was rejected as conflicting.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ConflictReason {
    /// Same content already stored under another name.
    #[display("has different name. Expected {}, but is {}", existing, candidate)]
    NameMismatch {
        /// Name of the stored record.
        existing: String,
        /// Name of the rejected upload.
        candidate: String,
    },
    /// Same content already stored with another tag set.
    #[display("has different tag ids")]
    TagMismatch,
    /// A pending upload of the same content has not gone stale yet.
    #[display("upload of the same content is still in progress")]
    UploadInFlight,
}

impl ConflictReason {
    /// Already-exists error referencing `existing_id`.
    #[track_caller]
    pub fn to_error(&self, existing_id: &MediaId) -> MediaError {
        MediaError::already_exists(
            existing_id.as_str(),
            format!("media already exists at id {} but {}", existing_id, self),
        )
    }
}

/// Decide how to treat `candidate` given the record found by its checksum.
///
/// A pending record counts as abandoned once `last_update + incomplete_lifetime`
/// lies before `now`.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use std::time::Duration;
/// use tagvault_core::{DedupDecision, MediaMetadataBuilder, decide};
///
/// let candidate = MediaMetadataBuilder::default()
///     .id("id-1")
///     .name("pic1")
///     .checksum("abc")
///     .last_update(Utc::now())
///     .build()
///     .unwrap();
///
/// let decision = decide(&candidate, None, Utc::now(), Duration::from_secs(60));
/// assert_eq!(decision, DedupDecision::Proceed);
/// ```
pub fn decide(
    candidate: &MediaMetadata,
    existing: Option<&MediaMetadata>,
    now: DateTime<Utc>,
    incomplete_lifetime: Duration,
) -> DedupDecision {
    let Some(existing) = existing else {
        return DedupDecision::Proceed;
    };
    let existing_id = existing.id().clone();

    if existing.upload_complete() {
        if candidate.name() != existing.name() {
            return DedupDecision::RejectConflict {
                existing_id,
                reason: ConflictReason::NameMismatch {
                    existing: existing.name().clone(),
                    candidate: candidate.name().clone(),
                },
            };
        }

        if !tag_sets_equal(candidate.tag_ids(), existing.tag_ids()) {
            return DedupDecision::RejectConflict {
                existing_id,
                reason: ConflictReason::TagMismatch,
            };
        }

        return DedupDecision::ReuseExisting(existing_id);
    }

    if is_stale(existing, now, incomplete_lifetime) {
        DedupDecision::ProceedOverwrite(existing_id)
    } else {
        DedupDecision::RejectConflict {
            existing_id,
            reason: ConflictReason::UploadInFlight,
        }
    }
}

/// Whether `record` is pending and was last written more than `lifetime` before `now`.
///
/// A `last_update` in the future never counts as stale.
pub fn is_stale(record: &MediaMetadata, now: DateTime<Utc>, lifetime: Duration) -> bool {
    if record.upload_complete() {
        return false;
    }

    match now.signed_duration_since(*record.last_update()).to_std() {
        Ok(elapsed) => elapsed > lifetime,
        Err(_) => false,
    }
}

/// Order-insensitive equality of two tag id lists of the same length.
///
/// # Examples
///
/// ```
/// use tagvault_core::{TagId, tag_sets_equal};
///
/// let a = vec![TagId::from("t1"), TagId::from("t2")];
/// let b = vec![TagId::from("t2"), TagId::from("t1")];
/// let c = vec![TagId::from("t1"), TagId::from("t1")];
///
/// assert!(tag_sets_equal(&a, &b));
/// assert!(!tag_sets_equal(&a, &c));
/// assert!(!tag_sets_equal(&a[..1], &c));
/// ```
pub fn tag_sets_equal(lhs: &[TagId], rhs: &[TagId]) -> bool {
    lhs.len() == rhs.len()
        && lhs.iter().all(|tag| rhs.contains(tag))
        && rhs.iter().all(|tag| lhs.contains(tag))
}
