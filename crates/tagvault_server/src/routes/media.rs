//! Media upload and lookup.

use crate::{ApiError, AppState};
use axum::Json;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Query, State};
use serde::{Deserialize, Serialize};
use tagvault_core::{MediaItem, TagId};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Body of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMediaResponse {
    /// Id of the stored (or already present) media.
    pub media_id: String,
}

/// Query of `GET /media`.
#[derive(Debug, Deserialize)]
pub struct FindMediaQuery {
    /// Tag to search for.
    pub tag_id: Option<String>,
}

/// One entry of the `GET /media` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItemResponse {
    /// Display name.
    pub name: String,
    /// Tags attached at upload.
    pub tag_ids: Vec<String>,
    /// Presigned download URL. Absent when it could not be generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl From<MediaItem> for MediaItemResponse {
    fn from(item: MediaItem) -> Self {
        Self {
            name: item.metadata().name().clone(),
            tag_ids: item
                .metadata()
                .tag_ids()
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            file_url: item.file_url().clone(),
        }
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::new(
        err.status(),
        "bad_user_input",
        format!("invalid multipart form: {}", err.body_text()),
    )
}

/// Copy a file part into an anonymous temp file and rewind it.
async fn spool(field: &mut Field<'_>) -> Result<tokio::fs::File, ApiError> {
    let spool_error = |e: std::io::Error| ApiError::internal(format!("failed to spool upload: {}", e));

    let mut file = tokio::fs::File::from_std(tempfile::tempfile().map_err(spool_error)?);
    let mut size = 0usize;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len();
        file.write_all(&chunk).await.map_err(spool_error)?;
    }
    file.flush().await.map_err(spool_error)?;
    file.rewind().await.map_err(spool_error)?;

    tracing::debug!(size, "Spooled upload");
    Ok(file)
}

/// `POST /media`: multipart `name`, `tag_ids[]` and `file`.
#[tracing::instrument(skip_all)]
pub async fn create_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<CreateMediaResponse>, ApiError> {
    let mut name: Option<String> = None;
    let mut tag_ids: Vec<TagId> = Vec::new();
    let mut file: Option<tokio::fs::File> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => name = Some(field.text().await.map_err(multipart_error)?),
            Some("tag_ids[]") | Some("tag_ids") => {
                tag_ids.push(TagId::new(field.text().await.map_err(multipart_error)?));
            }
            Some("file") => file = Some(spool(&mut field).await?),
            other => tracing::debug!(field = ?other, "Ignoring unknown form field"),
        }
    }

    let name = name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("File name is required"))?;
    let mut file = file.ok_or_else(|| ApiError::bad_request("Error retrieving the file"))?;

    let ctx = state.call_context();
    let media_id = state
        .media()
        .create_media(&ctx, &name, tag_ids, &mut file)
        .await?;

    Ok(Json(CreateMediaResponse {
        media_id: media_id.into_inner(),
    }))
}

/// `GET /media?tag_id=`: media carrying a tag.
#[tracing::instrument(skip_all)]
pub async fn find_media(
    State(state): State<AppState>,
    Query(query): Query<FindMediaQuery>,
) -> Result<Json<Vec<MediaItemResponse>>, ApiError> {
    let tag_id = query
        .tag_id
        .filter(|tag_id| !tag_id.is_empty())
        .ok_or_else(|| ApiError::bad_request("tag_id parameter is required"))?;

    let ctx = state.call_context();
    let items = state
        .media()
        .find_by_tag(&ctx, &TagId::new(tag_id))
        .await?;

    Ok(Json(items.into_iter().map(MediaItemResponse::from).collect()))
}
