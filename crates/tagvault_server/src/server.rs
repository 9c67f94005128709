//! Process wiring: stores, service, HTTP listener.

use crate::{AppState, AppStateBuilder, TagvaultConfig, router};
use std::net::SocketAddr;
use std::sync::Arc;
use tagvault_error::{ConfigError, TagvaultResult};
use tagvault_ingest::MediaServiceBuilder;
use tagvault_storage::{FileMetadataStore, FileSystemBlobStore, FileTagStore, UrlSigner};
use tokio::task::JoinHandle;

/// Everything a running server is built from.
pub struct Assembly {
    /// Handler state.
    pub state: AppState,
    /// Metadata store, for the expiry sweeper.
    pub metadata: FileMetadataStore,
}

/// Build stores, service and handler state from a validated configuration.
///
/// # Errors
///
/// Returns an error if the blob directory cannot be created, a state snapshot
/// cannot be read, or the configuration is incomplete.
#[tracing::instrument(skip(config))]
pub fn assemble(config: &TagvaultConfig) -> TagvaultResult<Assembly> {
    let metadata = FileMetadataStore::open(
        config.metadata_snapshot_path(),
        config.incomplete_metadata_lifetime(),
    )?;
    let tags = Arc::new(FileTagStore::open(config.tags_snapshot_path())?);
    let signer = UrlSigner::new(&config.server.base_url, &config.storage.url_signing_secret);
    let blobs = Arc::new(FileSystemBlobStore::new(&config.storage.blob_dir, signer)?);

    let media = MediaServiceBuilder::default()
        .tags(tags.clone())
        .metadata(Arc::new(metadata.clone()))
        .blobs(blobs.clone())
        .config(config.media_service_config()?)
        .span(tracing::info_span!("media_service"))
        .build()?;

    let state = AppStateBuilder::default()
        .media(Arc::new(media))
        .tags(tags)
        .blobs(blobs)
        .request_timeout(config.request_timeout())
        .max_upload_bytes(config.max_upload_bytes())
        .build()
        .map_err(|e| ConfigError::new(format!("Incomplete server state: {}", e)))?;

    Ok(Assembly { state, metadata })
}

/// Validate `config`, then serve the API until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error for an invalid configuration, or if the listener cannot be
/// bound.
pub async fn serve(config: TagvaultConfig) -> TagvaultResult<()> {
    config.validate()?;

    let Assembly { state, metadata } = assemble(&config)?;
    let sweeper: JoinHandle<()> = metadata.spawn_expiry_sweeper(config.expiry_sweep_interval());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, base_url = %config.server.base_url, "Tagvault listening");

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();
    tracing::info!("Tagvault stopped");
    Ok(result?)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
