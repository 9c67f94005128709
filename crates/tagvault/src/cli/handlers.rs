//! Command handlers.

use std::path::Path;
use tagvault::{TagvaultConfig, TagvaultResult};

/// Handle the `serve` command
pub async fn handle_serve(config_path: Option<&Path>) -> TagvaultResult<()> {
    let config = TagvaultConfig::load(config_path)?;
    tracing::info!(
        port = config.server.http_port,
        blob_dir = %config.storage.blob_dir.display(),
        "Starting Tagvault. Press Ctrl+C to stop."
    );
    tagvault::serve(config).await
}

/// Handle the `config` command
pub fn handle_config(config_path: Option<&Path>) -> TagvaultResult<()> {
    let config = TagvaultConfig::load(config_path)?;
    print!("{}", config.to_toml()?);
    if let Err(e) = config.validate() {
        tracing::warn!(error = %e.message, "Configuration is not yet servable");
    }
    Ok(())
}
