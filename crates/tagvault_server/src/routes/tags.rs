//! Tag vocabulary.

use crate::{ApiError, AppState};
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Body of `POST /tags`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateTagRequest {
    /// Tag name.
    pub name: String,
}

/// Response of `POST /tags`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreateTagResponse {
    /// Id of the created or existing tag.
    pub tag_id: String,
}

/// One entry of `GET /tags`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagResponse {
    /// Tag id.
    pub id: String,
    /// Tag name.
    pub name: String,
}

/// `GET /tags`
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let tags = state.tags().list_tags().await?;
    Ok(Json(
        tags.into_iter()
            .map(|tag| TagResponse {
                id: tag.id().as_str().to_string(),
                name: tag.name().clone(),
            })
            .collect(),
    ))
}

/// `POST /tags`
#[tracing::instrument(skip_all)]
pub async fn create_tag(
    State(state): State<AppState>,
    Json(request): Json<CreateTagRequest>,
) -> Result<Json<CreateTagResponse>, ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("tag name is required"));
    }

    let tag_id = state.tags().create_tag(name).await?;
    Ok(Json(CreateTagResponse {
        tag_id: tag_id.as_str().to_string(),
    }))
}
