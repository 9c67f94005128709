//! Mapping of service errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tagvault_error::{MediaError, MediaErrorKind, StorageError, StorageErrorKind};

/// An error ready to be sent to the client.
///
/// Rendered as `{"error": {"code", "message", "media_id"?}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    media_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_id: Option<&'a str>,
}

impl ApiError {
    /// Error with an explicit status and code.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            media_id: None,
        }
    }

    /// 400 caused by the request itself.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_user_input", message)
    }

    /// 500 for failures on our side.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        let (status, code) = match err.kind() {
            MediaErrorKind::BadUserInput(_) => (StatusCode::BAD_REQUEST, "bad_user_input"),
            MediaErrorKind::ResourceAlreadyExists { .. } => {
                (StatusCode::CONFLICT, "resource_already_exists")
            }
            MediaErrorKind::ResourceNotFound(_) => (StatusCode::NOT_FOUND, "resource_not_found"),
            MediaErrorKind::InputOutput(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "input_output")
            }
            MediaErrorKind::UpstreamCommunication { .. } => {
                (StatusCode::BAD_GATEWAY, "upstream_communication")
            }
            MediaErrorKind::UpstreamUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "upstream_unavailable")
            }
            MediaErrorKind::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            MediaErrorKind::Cancelled(_) => (StatusCode::INTERNAL_SERVER_ERROR, "cancelled"),
            MediaErrorKind::IllegalState(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "illegal_state")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        } else {
            tracing::debug!(error = %err, "Request rejected");
        }

        Self {
            status,
            code,
            message: err.kind().to_string(),
            media_id: err.existing_id().map(str::to_string),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err.kind {
            StorageErrorKind::SignatureRejected(_) => {
                Self::new(StatusCode::FORBIDDEN, "signature_rejected", err.kind.to_string())
            }
            StorageErrorKind::NotFound(_) | StorageErrorKind::InvalidKey(_) => {
                Self::new(StatusCode::NOT_FOUND, "resource_not_found", err.kind.to_string())
            }
            _ => Self::from(MediaError::from(err)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: &self.message,
                media_id: self.media_id.as_deref(),
            },
        };
        (self.status, Json(body)).into_response()
    }
}
