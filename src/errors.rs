use crate::services::photo_service::PhotoError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{error::Error as _, fmt};

/// HTTP-facing error: a status and the message shown to the client.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

/// Storage failures are logged with their cause here and reach the client
/// only as a fixed message.
impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        match err {
            PhotoError::InvalidRequest(msg) => AppError::bad_request(msg),
            PhotoError::NotFound(_) => AppError::not_found("Photo not found"),
            PhotoError::StoreUnavailable(_) => {
                log_cause(&err);
                AppError::internal("Failed to fetch photos")
            }
            PhotoError::UploadFailed(_) => {
                log_cause(&err);
                AppError::internal("Upload failed")
            }
            PhotoError::DeleteFailed(_) => {
                log_cause(&err);
                AppError::internal("Delete failed")
            }
        }
    }
}

fn log_cause(err: &PhotoError) {
    match err.source() {
        Some(cause) => tracing::error!(error = %err, cause = %cause, "storage call failed"),
        None => tracing::error!(error = %err, "storage call failed"),
    }
}
