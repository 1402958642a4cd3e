use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::prediction::ErrorResponse;
use crate::services::store::StoreError;

/// Errors raised by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Job not found")]
    JobNotFound,

    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("missing 'file' field in upload")]
    MissingFile,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::JobNotFound | ApiError::Store(StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Job not found".to_string())
            }
            ApiError::Multipart(e) => (e.status(), self.to_string()),
            ApiError::MissingFile => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "Job store request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
