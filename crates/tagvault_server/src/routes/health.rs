//! Liveness and readiness checks.

use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;

/// `GET /health/live`
pub async fn live() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// `GET /health/ready`: ready once the blob directory is reachable.
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    match tokio::fs::try_exists(state.blobs().base_path()).await {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) | Err(_) => {
            tracing::warn!(path = %state.blobs().base_path().display(), "Blob directory unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
