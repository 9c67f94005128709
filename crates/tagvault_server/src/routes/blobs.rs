//! Signed blob downloads.

use crate::{ApiError, AppState};
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio::io::AsyncReadExt;

/// Bytes per body frame when streaming a blob.
const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Query part of a presigned URL.
#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    /// Unix time the URL stops working.
    pub expires: i64,
    /// Hex HMAC over key and expiry.
    pub signature: String,
}

/// `GET /blobs/{key}?expires=&signature=`
#[tracing::instrument(skip_all, fields(key = %key))]
pub async fn get_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, ApiError> {
    let file = state
        .blobs()
        .open_signed(&key, query.expires, &query.signature)
        .await?;

    let chunks = futures::stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; DOWNLOAD_CHUNK_SIZE];
        let read = file.read(&mut buf).await?;
        if read == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        buf.truncate(read);
        Ok(Some((buf, file)))
    });

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(chunks),
    )
        .into_response())
}
