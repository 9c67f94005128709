//! Top-level error wrapper types.

use crate::{ConfigError, MediaError, StorageError};

/// Every error a Tagvault process can surface.
///
/// # Examples
///
/// ```
/// use tagvault_error::{ConfigError, TagvaultError};
///
/// let err: TagvaultError = ConfigError::new("missing secret").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TagvaultErrorKind {
    /// Ingestion or retrieval error
    #[from(MediaError)]
    Media(MediaError),
    /// Storage backend error
    #[from(StorageError)]
    Storage(StorageError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Process level I/O error (binding sockets, reading files)
    #[from(std::io::Error)]
    Io(std::io::Error),
}

/// Tagvault error with kind discrimination.
///
/// # Examples
///
/// ```
/// use tagvault_error::{ConfigError, TagvaultResult};
///
/// fn load() -> TagvaultResult<()> {
///     Err(ConfigError::new("storage.url_signing_secret is empty"))?
/// }
///
/// assert!(load().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tagvault Error: {}", _0)]
pub struct TagvaultError(Box<TagvaultErrorKind>);

impl TagvaultError {
    /// Create a new error from a kind.
    pub fn new(kind: TagvaultErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TagvaultErrorKind {
        &self.0
    }
}

impl<T> From<T> for TagvaultError
where
    T: Into<TagvaultErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tagvault operations.
pub type TagvaultResult<T> = std::result::Result<T, TagvaultError>;
