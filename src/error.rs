use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::models::ErrorResponse;

/// errors on the upload data path
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("request is missing the sessionId query parameter")]
    MissingSessionId,

    #[error("malformed multipart body: {0}")]
    Decode(#[from] multer::Error),

    #[error("failed to store {filename}: {source}")]
    Io {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{} part(s) failed: {}", .failed.len(), .failed.join(", "))]
    PartsFailed { failed: Vec<String> },
}

impl UploadError {
    pub fn io(filename: impl Into<String>, source: std::io::Error) -> Self {
        UploadError::Io {
            filename: filename.into(),
            source,
        }
    }

    /// stable identifier placed in the `error` field of the response body
    pub fn kind(&self) -> &'static str {
        match self {
            UploadError::MissingSessionId => "missing_session_id",
            UploadError::Decode(_) => "decode_error",
            UploadError::Io { .. } => "io_error",
            UploadError::PartsFailed { .. } => "upload_failed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::MissingSessionId | UploadError::Decode(_) => StatusCode::BAD_REQUEST,
            UploadError::Io { .. } | UploadError::PartsFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.kind(), self.to_string())
    }
}

/// the listing directory could not be read
#[derive(Debug, thiserror::Error)]
#[error("failed to list {path}: {source}")]
pub struct ListingError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "listing_error",
            self.to_string(),
        )
    }
}

fn error_response(status: StatusCode, kind: &str, message: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: kind.to_string(),
            message,
        }),
    )
        .into_response()
}
