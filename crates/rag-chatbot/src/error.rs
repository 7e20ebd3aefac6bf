//! Error types for the RAG chatbot

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG chatbot errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied a bad question or top_k
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Request body exceeded the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Retrieval produced nothing to answer from
    #[error("Not found: {0}")]
    NotFound(String),

    /// An external provider is missing or failed
    #[error("{provider} unavailable: {message}")]
    DependencyUnavailable { provider: String, message: String },

    /// A pipeline stage exceeded its time budget
    #[error("Stage '{stage}' timed out after {millis}ms")]
    Timeout { stage: &'static str, millis: u64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a dependency error attributed to `provider`
    pub fn dependency(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DependencyUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Config(_)
            | Error::DependencyUnavailable { .. }
            | Error::Timeout { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::NotFound(_) => "not_found",
            Error::PayloadTooLarge(_) => "payload_too_large",
            Error::DependencyUnavailable { .. } => "dependency_unavailable",
            Error::Timeout { .. } => "timeout",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show a client. Provider and internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidArgument(msg) | Error::NotFound(msg) | Error::PayloadTooLarge(msg) => {
                msg.clone()
            }
            Error::DependencyUnavailable { .. } => {
                "A required upstream service is unavailable".to_string()
            }
            Error::Timeout { .. } => "Upstream service timed out".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "Request failed: {}", self);
        } else {
            tracing::debug!(kind = self.kind(), "Request rejected: {}", self);
        }

        let message = self.public_message();
        let body = Json(json!({
            "detail": message,
            "error": {
                "type": self.kind(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = Error::invalid_argument("Question cannot be empty");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Question cannot be empty");

        let err = Error::not_found("No relevant content found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn test_dependency_errors_are_sanitized() {
        let err = Error::dependency("qdrant", "connection refused at 10.0.0.3:6333");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("10.0.0.3"));
        assert!(err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn test_timeout_maps_to_server_error() {
        let err = Error::Timeout { stage: "generation", millis: 30_000 };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn test_sub_second_timeout_is_reported_in_millis() {
        let err = Error::Timeout { stage: "search", millis: 250 };
        assert_eq!(err.to_string(), "Stage 'search' timed out after 250ms");
    }

    #[test]
    fn test_payload_too_large_status() {
        let err = Error::PayloadTooLarge("length limit exceeded".to_string());
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.kind(), "payload_too_large");
        assert_eq!(err.public_message(), "length limit exceeded");
    }
}
