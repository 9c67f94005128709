//! HTTP API and configuration for the Tagvault media service.
//!
//! Thin adapter over [`tagvault_ingest::MediaService`]: parses requests, spools
//! uploads to temp files, and maps the error taxonomy onto status codes.
//!
//! # Routes
//!
//! All under `/api/v1`:
//!
//! | route | purpose |
//! |---|---|
//! | `GET /health/live`, `GET /health/ready` | health checks |
//! | `POST /media` | multipart upload (`name`, `tag_ids[]`, `file`) |
//! | `GET /media?tag_id=` | media carrying a tag, with presigned URLs |
//! | `GET /tags`, `POST /tags` | tag vocabulary |
//! | `GET /blobs/{key}?expires=&signature=` | presigned download |

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod routes;
mod server;
mod state;

pub use config::{
    CONFIG_PATH_ENV, ENV_PREFIX, MediaConfig, ServerConfig, StorageConfig, TagvaultConfig,
};
pub use error::ApiError;
pub use routes::{
    CreateMediaResponse, CreateTagRequest, CreateTagResponse, MediaItemResponse, TagResponse,
    router,
};
pub use server::{Assembly, assemble, serve};
pub use state::{AppState, AppStateBuilder};
