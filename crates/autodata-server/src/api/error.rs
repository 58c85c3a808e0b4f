//! API error type and its JSON rendering.

use autodata_cleaning::CleaningError;
use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Multipart body could not be read (400, or 413 past the upload limit)
    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// JSON body missing or malformed (400)
    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),

    /// Cleaning pipeline or data source failure, status depends on the cause
    #[error(transparent)]
    Cleaning(#[from] CleaningError),

    /// Blocking task panicked or was aborted (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Json(_) => StatusCode::BAD_REQUEST,
            // 413 when the upload exceeds the body limit, 400 otherwise
            ApiError::Multipart(err) => err.status(),
            ApiError::Cleaning(err) if err.is_cancelled() => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Cleaning(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Cleaning(err) if err.is_upstream_error() => StatusCode::BAD_GATEWAY,
            ApiError::Cleaning(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Multipart(_) => "INVALID_MULTIPART",
            ApiError::Json(_) => "INVALID_JSON",
            ApiError::Cleaning(err) => err.error_code(),
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        } else {
            warn!("Request rejected ({}): {}", status, self);
        }

        let body = Json(json!({
            "code": self.code(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("missing file".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CleaningError::UnsupportedFileType("a.txt".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CleaningError::UpstreamStatus { status: 404 }).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(CleaningError::Database("refused".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(CleaningError::Cancelled).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Internal("join".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(
            ApiError::from(CleaningError::UpstreamStatus { status: 500 }).code(),
            "UPSTREAM_STATUS"
        );
        assert_eq!(ApiError::BadRequest("x".to_string()).code(), "BAD_REQUEST");
    }
}
