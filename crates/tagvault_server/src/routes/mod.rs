//! HTTP routes, all under `/api/v1`.

mod blobs;
mod health;
mod media;
mod tags;

pub use media::{CreateMediaResponse, MediaItemResponse};
pub use tags::{CreateTagRequest, CreateTagResponse, TagResponse};

use crate::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Router serving the full API.
pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(*state.max_upload_bytes());

    let api = Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route(
            "/media",
            get(media::find_media)
                .post(media::create_media)
                .layer(upload_limit),
        )
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/blobs/:key", get(blobs::get_blob));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
