//! Configuration loading.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Bundled defaults (`defaults.toml` shipped with the crate)
//! 2. `~/.config/tagvault/tagvault.toml` (optional)
//! 3. `./tagvault.toml` (optional)
//! 4. An explicit file, from `--config` or `TAGVAULT_CONFIG` (must exist)
//! 5. Environment variables `TAGVAULT__<SECTION>__<KEY>`, e.g.
//!    `TAGVAULT__SERVER__HTTP_PORT=9000`

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tagvault_error::ConfigError;
use tagvault_ingest::{MediaServiceConfig, MediaServiceConfigBuilder};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../defaults.toml");

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "TAGVAULT_CONFIG";

/// Prefix of configuration override environment variables.
pub const ENV_PREFIX: &str = "TAGVAULT";

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Public base URL, used in presigned blob URLs.
    pub base_url: String,
    /// Port to listen on.
    pub http_port: u16,
    /// Largest accepted upload body in megabytes.
    pub max_upload_size_mb: u64,
    /// Deadline for handling one request.
    pub request_timeout_secs: u64,
}

/// Store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory of the filesystem blob store.
    pub blob_dir: PathBuf,
    /// Directory holding the metadata and tag snapshots.
    pub state_dir: PathBuf,
    /// HMAC key for presigned blob URLs.
    pub url_signing_secret: String,
    /// Period of the background expiry pass over pending metadata.
    pub expiry_sweep_interval_secs: u64,
}

/// Media lifetimes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MediaConfig {
    /// Validity of presigned retrieval URLs.
    pub media_url_lifetime_secs: u64,
    /// Age after which a pending upload counts as abandoned.
    pub incomplete_metadata_lifetime_secs: u64,
}

/// Complete Tagvault configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagvaultConfig {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Stores.
    pub storage: StorageConfig,
    /// Media lifetimes.
    pub media: MediaConfig,
}

impl TagvaultConfig {
    /// The bundled defaults alone.
    ///
    /// The signing secret is empty, so the result does not pass [`validate`](Self::validate)
    /// until one is set.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::deserialize_from(Config::builder().add_source(File::from_str(
            DEFAULT_CONFIG,
            FileFormat::Toml,
        )))
    }

    /// Load a single file on top of the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading configuration from file");

        Self::deserialize_from(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from(path.as_ref())),
        )
    }

    /// Load configuration from every source, in precedence order.
    ///
    /// `explicit` takes priority over `TAGVAULT_CONFIG`. The result is not yet
    /// validated.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tagvault_server::TagvaultConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = TagvaultConfig::load(None)?;
    /// config.validate()?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        debug!("Loading configuration with precedence: env > explicit > current dir > home dir > defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/tagvault/tagvault.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("tagvault").required(false));

        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        if let Some(path) = explicit {
            debug!(path = %path.display(), "Adding explicit configuration file");
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        Self::deserialize_from(builder)
    }

    fn deserialize_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))
    }

    /// Check every property for a usable value.
    ///
    /// # Errors
    ///
    /// Returns the first offending property.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.trim().is_empty() {
            return Err(ConfigError::empty_property("server", "base_url"));
        }
        if !self.server.base_url.starts_with("http://")
            && !self.server.base_url.starts_with("https://")
        {
            return Err(ConfigError::invalid_property(
                "server",
                "base_url",
                "must start with http:// or https://",
            ));
        }
        if self.server.http_port == 0 {
            return Err(ConfigError::invalid_property(
                "server",
                "http_port",
                "must not be 0",
            ));
        }
        if self.server.max_upload_size_mb < 1 {
            return Err(ConfigError::invalid_property(
                "server",
                "max_upload_size_mb",
                "must be at least 1",
            ));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::invalid_property(
                "server",
                "request_timeout_secs",
                "must not be 0",
            ));
        }
        if self.storage.blob_dir.as_os_str().is_empty() {
            return Err(ConfigError::empty_property("storage", "blob_dir"));
        }
        if self.storage.state_dir.as_os_str().is_empty() {
            return Err(ConfigError::empty_property("storage", "state_dir"));
        }
        if self.storage.url_signing_secret.is_empty() {
            return Err(ConfigError::empty_property("storage", "url_signing_secret"));
        }
        if self.storage.expiry_sweep_interval_secs == 0 {
            return Err(ConfigError::invalid_property(
                "storage",
                "expiry_sweep_interval_secs",
                "must not be 0",
            ));
        }
        if self.media.media_url_lifetime_secs == 0 {
            return Err(ConfigError::invalid_property(
                "media",
                "media_url_lifetime_secs",
                "must not be 0",
            ));
        }
        if self.media.incomplete_metadata_lifetime_secs == 0 {
            return Err(ConfigError::invalid_property(
                "media",
                "incomplete_metadata_lifetime_secs",
                "must not be 0",
            ));
        }
        Ok(())
    }

    /// Render as TOML, with the signing secret masked.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        if !shown.storage.url_signing_secret.is_empty() {
            shown.storage.url_signing_secret = "********".to_string();
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| ConfigError::new(format!("Failed to render configuration: {}", e)))
    }

    /// Largest accepted upload body in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.server.max_upload_size_mb.saturating_mul(1024 * 1024))
            .unwrap_or(usize::MAX)
    }

    /// Per-request deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Snapshot file of the metadata store.
    pub fn metadata_snapshot_path(&self) -> PathBuf {
        self.storage.state_dir.join("metadata.json")
    }

    /// Snapshot file of the tag vocabulary.
    pub fn tags_snapshot_path(&self) -> PathBuf {
        self.storage.state_dir.join("tags.json")
    }

    /// Period of the background expiry pass.
    pub fn expiry_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.storage.expiry_sweep_interval_secs)
    }

    /// Age after which a pending upload counts as abandoned.
    pub fn incomplete_metadata_lifetime(&self) -> Duration {
        Duration::from_secs(self.media.incomplete_metadata_lifetime_secs)
    }

    /// Lifetimes for the media service.
    pub fn media_service_config(&self) -> Result<MediaServiceConfig, ConfigError> {
        MediaServiceConfigBuilder::default()
            .media_url_lifetime(Duration::from_secs(self.media.media_url_lifetime_secs))
            .incomplete_metadata_lifetime(self.incomplete_metadata_lifetime())
            .build()
            .map_err(|e| ConfigError::new(format!("Invalid media configuration: {}", e)))
    }
}
