//! Error types for xkcd-mirror
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (transport, decoding, persistence)
//! - HTTP status code mapping for the read-only API
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for xkcd-mirror operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xkcd-mirror
///
/// Fetch failures come in two flavours: [`Error::Transport`] when the remote could
/// not be reached or answered with a non-success status, and [`Error::Decode`] when
/// it answered with a body that is not a usable document. Both are absorbed per item
/// during synchronization and are only fatal while discovering the latest document.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "sync.concurrency")
        key: Option<String>,
    },

    /// Network or HTTP status failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Response body could not be turned into a document
    #[error("decode error for {url}: {reason}")]
    Decode {
        /// URL whose response failed to decode
        url: String,
        /// What was wrong with the body
        reason: String,
    },

    /// Index storage failure
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document identifiers start at 1
    #[error("invalid document id {0}: ids start at 1")]
    InvalidId(u32),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Transport-level failures reported by the HTTP collaborator
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or timed out
    #[error("request to {url} failed: {source}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The response body could not be read
    #[error("failed to read response body from {url}: {source}")]
    Body {
        /// Requested URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// URL of the failed request
    pub fn url(&self) -> &str {
        match self {
            TransportError::Request { url, .. }
            | TransportError::Status { url, .. }
            | TransportError::Body { url, .. } => url,
        }
    }
}

/// Index storage errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Failed to open the index database
    #[error("failed to open index: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A document cannot be written to the index
    #[error("document {id} cannot be stored: {reason}")]
    InvalidDocument {
        /// Offending document id
        id: u32,
        /// Why it was rejected
        reason: String,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_found",
///     "message": "not found: comic 404",
///     "details": { "id": 404 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Config { .. } => 400,
            Error::InvalidId(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 422 Unprocessable Entity
            Error::Persistence(PersistenceError::InvalidDocument { .. }) => 422,

            // 500 Internal Server Error
            Error::Persistence(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - upstream failures
            Error::Transport(_) => 502,
            Error::Decode { .. } => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Transport(e) => match e {
                TransportError::Request { .. } => "transport_error",
                TransportError::Status { .. } => "upstream_status",
                TransportError::Body { .. } => "transport_error",
            },
            Error::Decode { .. } => "decode_error",
            Error::Persistence(e) => match e {
                PersistenceError::InvalidDocument { .. } => "invalid_document",
                _ => "persistence_error",
            },
            Error::Sqlx(_) => "persistence_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::InvalidId(_) => "invalid_id",
            Error::NotFound(_) => "not_found",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Transport(e) => Some(serde_json::json!({
                "url": e.url(),
            })),
            Error::Decode { url, .. } => Some(serde_json::json!({
                "url": url,
            })),
            Error::InvalidId(id) => Some(serde_json::json!({
                "id": id,
            })),
            Error::Persistence(PersistenceError::InvalidDocument { id, .. }) => {
                Some(serde_json::json!({
                    "id": id,
                }))
            }
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// (Error, expected_status_code, expected_error_code) for every reachable arm
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "concurrency must be positive".into(),
                    key: Some("sync.concurrency".into()),
                },
                400,
                "config_error",
            ),
            (Error::InvalidId(0), 400, "invalid_id"),
            (Error::NotFound("comic 404".into()), 404, "not_found"),
            (
                Error::Transport(TransportError::Status {
                    url: "https://xkcd.com/404/info.0.json".into(),
                    status: 404,
                }),
                502,
                "upstream_status",
            ),
            (
                Error::Decode {
                    url: "https://xkcd.com/info.0.json".into(),
                    reason: "expected value".into(),
                },
                502,
                "decode_error",
            ),
            (
                Error::Persistence(PersistenceError::InvalidDocument {
                    id: 0,
                    reason: "unresolved".into(),
                }),
                422,
                "invalid_document",
            ),
            (
                Error::Persistence(PersistenceError::QueryFailed("locked".into())),
                500,
                "persistence_error",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::Other("unknown".into()), 500, "internal_error"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_and_code() {
        for (error, status, code) in all_error_variants() {
            assert_eq!(error.status_code(), status, "status for {error}");
            assert_eq!(error.error_code(), code, "code for {error}");
        }
    }

    #[test]
    fn transport_error_details_carry_url() {
        let error = Error::Transport(TransportError::Status {
            url: "https://xkcd.com/3/info.0.json".into(),
            status: 500,
        });
        let api_error: ApiError = error.into();

        assert_eq!(api_error.error.code, "upstream_status");
        assert!(api_error.error.message.contains("HTTP 500"));
        let details = api_error.error.details.unwrap();
        assert_eq!(details["url"], "https://xkcd.com/3/info.0.json");
    }

    #[test]
    fn not_found_has_no_details() {
        let api_error: ApiError = Error::NotFound("comic 7".into()).into();
        assert_eq!(api_error.error.code, "not_found");
        assert!(api_error.error.details.is_none());
    }

    #[test]
    fn api_error_serializes_without_empty_details() {
        let json = serde_json::to_value(ApiError::not_found("comic 9")).unwrap();
        assert_eq!(json["error"]["code"], "not_found");
        assert_eq!(json["error"]["message"], "comic 9 not found");
        assert!(json["error"].get("details").is_none());
    }
}
