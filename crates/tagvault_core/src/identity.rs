//! Content identity derivation.
//!
//! Two fingerprints are derived from an upload:
//!
//! - the **checksum**, hex SHA-256 of the bytes alone, used to find duplicate content
//! - the **media id**, hex SHA-256 over `name`, every tag id and the checksum, used
//!   as primary key and blob key
//!
//! Tag ids are expected in canonical order (see [`canonical_tag_ids`]) so that the
//! id does not depend on the order a client listed them in.

use crate::{MediaId, TagId};
use sha2::{Digest, Sha256};
use std::io::SeekFrom;
use tagvault_error::{MediaError, MediaErrorKind, MediaResult};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// Bytes read per step while hashing an upload.
pub const CHECKSUM_CHUNK_SIZE: usize = 8 * 1024;

/// A seekable upload stream.
///
/// Hashed once, rewound, then read again by the blob store.
pub trait MediaSource: AsyncRead + AsyncSeek + Unpin + Send {}

impl<T> MediaSource for T where T: AsyncRead + AsyncSeek + Unpin + Send {}

/// Checksum and media id of one upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentIdentity {
    /// Derived media id.
    pub media_id: MediaId,
    /// Hex SHA-256 of the content.
    pub checksum: String,
}

/// Sort and deduplicate tag ids.
///
/// # Examples
///
/// ```
/// use tagvault_core::{TagId, canonical_tag_ids};
///
/// let tags = canonical_tag_ids(vec![TagId::from("b"), TagId::from("a"), TagId::from("b")]);
/// assert_eq!(tags, vec![TagId::from("a"), TagId::from("b")]);
/// ```
pub fn canonical_tag_ids(tag_ids: impl IntoIterator<Item = TagId>) -> Vec<TagId> {
    let mut tag_ids: Vec<TagId> = tag_ids.into_iter().collect();
    tag_ids.sort();
    tag_ids.dedup();
    tag_ids
}

/// Stream `source` through SHA-256 in bounded chunks.
///
/// Hashes from the start of the stream and leaves the read position at the start
/// again, also when reading failed.
///
/// # Errors
///
/// Returns [`MediaErrorKind::InputOutput`] if reading or seeking fails.
#[tracing::instrument(skip(source))]
pub async fn compute_checksum<R>(source: &mut R) -> MediaResult<String>
where
    R: MediaSource + ?Sized,
{
    source
        .seek(SeekFrom::Start(0))
        .await
        .map_err(|e| io_error("failed to seek to start of upload", e))?;

    let digest = hash_stream(source).await;
    let rewound = source.seek(SeekFrom::Start(0)).await;

    let checksum = digest?;
    rewound.map_err(|e| io_error("failed to rewind upload", e))?;

    tracing::debug!(checksum = %checksum, "Computed content checksum");
    Ok(checksum)
}

async fn hash_stream<R>(source: &mut R) -> MediaResult<String>
where
    R: MediaSource + ?Sized,
{
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHECKSUM_CHUNK_SIZE];

    loop {
        let read = source
            .read(&mut buffer)
            .await
            .map_err(|e| io_error("error reading upload", e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash `name`, each tag id in the given order, then `checksum`.
///
/// # Examples
///
/// ```
/// use tagvault_core::{TagId, derive_media_id};
///
/// let tags = vec![TagId::from("t1")];
/// let a = derive_media_id("pic1", &tags, "abc");
/// let b = derive_media_id("pic1", &tags, "abc");
/// let c = derive_media_id("pic2", &tags, "abc");
///
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// assert_eq!(a.as_str().len(), 64);
/// ```
pub fn derive_media_id(name: &str, tag_ids: &[TagId], checksum: &str) -> MediaId {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    for tag_id in tag_ids {
        hasher.update(tag_id.as_str().as_bytes());
    }
    hasher.update(checksum.as_bytes());

    MediaId::new(format!("{:x}", hasher.finalize()))
}

/// Compute checksum and media id for an upload.
///
/// `tag_ids` should already be canonical.
///
/// # Errors
///
/// Returns [`MediaErrorKind::InputOutput`] if the stream cannot be read.
pub async fn derive_identity<R>(
    source: &mut R,
    name: &str,
    tag_ids: &[TagId],
) -> MediaResult<ContentIdentity>
where
    R: MediaSource + ?Sized,
{
    let checksum = compute_checksum(source).await?;
    let media_id = derive_media_id(name, tag_ids, &checksum);

    Ok(ContentIdentity { media_id, checksum })
}

#[track_caller]
fn io_error(context: &str, err: std::io::Error) -> MediaError {
    MediaError::new(MediaErrorKind::InputOutput(format!("{}: {}", context, err)))
}
