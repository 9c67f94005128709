//! Error types for the Tagvault media service.
//!
//! This crate provides the error taxonomy shared by every Tagvault crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! [`MediaError`] is the classification every store and stream failure ends up
//! in before it leaves the ingestion core. Backend specific failures start out
//! as [`StorageError`] and are classified through `From<StorageError>`.
//!
//! # Examples
//!
//! ```
//! use tagvault_error::{MediaError, MediaErrorKind, MediaResult};
//!
//! fn check_tags(all_exist: bool) -> MediaResult<()> {
//!     if !all_exist {
//!         return Err(MediaError::new(MediaErrorKind::BadUserInput(
//!             "not all tag ids exist".to_string(),
//!         )));
//!     }
//!     Ok(())
//! }
//!
//! let err = check_tags(false).unwrap_err();
//! assert!(!err.is_retryable());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod media;
mod storage;

pub use config::ConfigError;
pub use error::{TagvaultError, TagvaultErrorKind, TagvaultResult};
pub use media::{MediaError, MediaErrorKind, MediaResult};
pub use storage::{StorageError, StorageErrorKind};
