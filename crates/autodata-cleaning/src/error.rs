//! Custom error types for the cleaning pipeline.
//!
//! This module provides a comprehensive error hierarchy using `thiserror`
//! for better error handling and context throughout the pipeline.
//!
//! Errors are serializable so that the HTTP backend can hand them to clients
//! as `{ "code": ..., "message": ... }` objects.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the cleaning pipeline.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// Pipeline was cancelled by the caller.
    #[error("Pipeline cancelled")]
    Cancelled,

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Uploaded or referenced file is not a CSV or Excel workbook.
    #[error("Unsupported file type '{0}'. Upload a CSV or Excel file.")]
    UnsupportedFileType(String),

    /// Input could not be turned into a table.
    #[error("Invalid input data: {0}")]
    InvalidData(String),

    /// Type conversion failed.
    #[error("Failed to convert column '{column}' to {target_type}: {reason}")]
    TypeConversionFailed {
        column: String,
        target_type: String,
        reason: String,
    },

    /// A remote API answered with a non-success status.
    #[error("API request failed with status {status}")]
    UpstreamStatus { status: u16 },

    /// Database query failed.
    #[error("Database error: {0}")]
    Database(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Excel workbook error.
    #[error("Excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// HTTP request error (only with a feature that pulls in reqwest).
    #[cfg(any(feature = "ai", feature = "remote"))]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => "CANCELLED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::TypeConversionFailed { .. } => "TYPE_CONVERSION_FAILED",
            Self::UpstreamStatus { .. } => "UPSTREAM_STATUS",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Excel(_) => "EXCEL_ERROR",
            #[cfg(any(feature = "ai", feature = "remote"))]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this error was caused by the caller's input rather than by
    /// the pipeline itself.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::UnsupportedFileType(_)
            | Self::InvalidData(_)
            | Self::InvalidConfig(_)
            | Self::ColumnNotFound(_)
            | Self::Json(_)
            | Self::Excel(_) => true,
            Self::WithContext { source, .. } => source.is_client_error(),
            _ => false,
        }
    }

    /// Check if this error came from a remote service the caller pointed us at.
    pub fn is_upstream_error(&self) -> bool {
        match self {
            Self::UpstreamStatus { .. } => true,
            #[cfg(any(feature = "ai", feature = "remote"))]
            Self::HttpRequest(_) => true,
            Self::WithContext { source, .. } => source.is_upstream_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(CleaningError::Cancelled.error_code(), "CANCELLED");
        assert_eq!(
            CleaningError::ColumnNotFound("test".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            CleaningError::UpstreamStatus { status: 404 }.error_code(),
            "UPSTREAM_STATUS"
        );
    }

    #[test]
    fn test_is_cancelled() {
        assert!(CleaningError::Cancelled.is_cancelled());
        assert!(!CleaningError::Database("x".to_string()).is_cancelled());
    }

    #[test]
    fn test_is_client_error() {
        assert!(CleaningError::UnsupportedFileType("a.txt".to_string()).is_client_error());
        assert!(
            CleaningError::InvalidData("bad".to_string())
                .with_context("Reading upload")
                .is_client_error()
        );
        assert!(!CleaningError::Database("down".to_string()).is_client_error());
    }

    #[test]
    fn test_is_upstream_error() {
        assert!(CleaningError::UpstreamStatus { status: 503 }.is_upstream_error());
        assert!(
            CleaningError::UpstreamStatus { status: 404 }
                .with_context("Fetching records")
                .is_upstream_error()
        );
        assert!(!CleaningError::Database("down".to_string()).is_upstream_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = CleaningError::UnsupportedFileType("notes.txt".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("UNSUPPORTED_FILE_TYPE"));
        assert!(json.contains("notes.txt"));
    }

    #[test]
    fn test_with_context() {
        let error =
            CleaningError::ColumnNotFound("age".to_string()).with_context("During type fixing");
        assert!(error.to_string().contains("During type fixing"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }
}
