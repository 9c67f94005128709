//! Media ingestion error taxonomy.

use crate::{StorageError, StorageErrorKind};

/// Result type for media ingestion and retrieval.
pub type MediaResult<T> = Result<T, MediaError>;

/// Kinds of media errors.
///
/// Every failure that leaves the ingestion core is one of these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum MediaErrorKind {
    /// Missing required field or reference to a nonexistent tag.
    #[display("Bad user input: {}", _0)]
    BadUserInput(String),

    /// Content already stored under conflicting labels, or an upload of the
    /// same content is still in flight.
    #[display("Resource already exists at id '{}': {}", existing_id, message)]
    ResourceAlreadyExists {
        /// Id of the record the request collided with.
        existing_id: String,
        /// Human readable description of the conflict.
        message: String,
    },

    /// Lookup target does not exist.
    #[display("Resource not found: {}", _0)]
    ResourceNotFound(String),

    /// Reading or hashing the uploaded stream failed.
    #[display("Input/output error: {}", _0)]
    InputOutput(String),

    /// A store answered with an error.
    #[display("Failed to communicate with {}: {}", upstream, message)]
    UpstreamCommunication {
        /// Name of the upstream backend.
        upstream: String,
        /// What went wrong.
        message: String,
    },

    /// A store could not be reached at all.
    #[display("Upstream unavailable: {}", _0)]
    UpstreamUnavailable(String),

    /// The call deadline passed before the operation finished.
    #[display("Timed out: {}", _0)]
    Timeout(String),

    /// The caller cancelled the operation.
    #[display("Cancelled: {}", _0)]
    Cancelled(String),

    /// An invariant the service relies on was violated.
    #[display("Illegal state: {}", _0)]
    IllegalState(String),
}

impl MediaErrorKind {
    /// Whether repeating the same request may succeed.
    ///
    /// Retry is opt-out: only errors caused by the request itself are final.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::BadUserInput(_) | Self::ResourceAlreadyExists { .. }
        )
    }
}

/// Media error with location tracking.
///
/// # Examples
///
/// ```
/// use tagvault_error::{MediaError, MediaErrorKind};
///
/// let err = MediaError::already_exists("abc123", "different name");
/// assert_eq!(err.existing_id(), Some("abc123"));
/// assert!(format!("{}", err).contains("abc123"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Media Error: {} at line {} in {}", kind, line, file)]
pub struct MediaError {
    /// The kind of error that occurred
    pub kind: MediaErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl MediaError {
    /// Create a new media error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: MediaErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Conflict with the record stored under `existing_id`.
    #[track_caller]
    pub fn already_exists(existing_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(MediaErrorKind::ResourceAlreadyExists {
            existing_id: existing_id.into(),
            message: message.into(),
        })
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MediaErrorKind {
        &self.kind
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Whether this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, MediaErrorKind::ResourceNotFound(_))
    }

    /// Id of the conflicting record, for already-exists errors.
    pub fn existing_id(&self) -> Option<&str> {
        match &self.kind {
            MediaErrorKind::ResourceAlreadyExists { existing_id, .. } => Some(existing_id),
            _ => None,
        }
    }
}

impl From<StorageError> for MediaError {
    #[track_caller]
    fn from(err: StorageError) -> Self {
        let kind = match err.kind {
            StorageErrorKind::NotFound(what) => MediaErrorKind::ResourceNotFound(what),
            StorageErrorKind::InvalidKey(what) => MediaErrorKind::BadUserInput(what),
            StorageErrorKind::SignatureRejected(what) => MediaErrorKind::BadUserInput(what),
            StorageErrorKind::Unavailable(what) => MediaErrorKind::UpstreamUnavailable(what),
            StorageErrorKind::FileRead(what) | StorageErrorKind::FileWrite(what) => {
                MediaErrorKind::InputOutput(what)
            }
            StorageErrorKind::DirectoryCreation(what) => MediaErrorKind::UpstreamCommunication {
                upstream: "blob store".to_string(),
                message: what,
            },
        };
        Self::new(kind)
    }
}

impl From<std::io::Error> for MediaError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(MediaErrorKind::InputOutput(err.to_string()))
    }
}
