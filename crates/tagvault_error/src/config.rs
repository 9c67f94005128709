//! Configuration error types.

/// Configuration error with source location.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagvault_error::ConfigError;
    ///
    /// let err = ConfigError::new("server.http_port must not be 0");
    /// assert!(err.message.contains("http_port"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Property `name` in section `section` is empty.
    #[track_caller]
    pub fn empty_property(section: &str, name: &str) -> Self {
        Self::new(format!("{}.{} is empty, but should not be", section, name))
    }

    /// Property `name` in section `section` has an unusable value.
    #[track_caller]
    pub fn invalid_property(section: &str, name: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(format!("{}.{}: {}", section, name, reason))
    }
}
