/*
[INPUT]:  Error sources (HTTP, API, serialization, config, storage)
[OUTPUT]: Structured error types with context
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the Zaplink SDK
#[derive(Error, Debug)]
pub enum ZaplinkError {
    /// Configuration is invalid or incomplete
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authenticated operation invoked without an active session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Caller input failed validation before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status
    #[error("API error (code {code}): {message}")]
    Api { code: i32, message: String },

    /// Well-formed response with success=false
    #[error("Request rejected: {message}")]
    Remote { message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Persisted session payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Storage adapter failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ZaplinkError {
    /// Check if error indicates an authentication problem
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ZaplinkError::NotAuthenticated)
    }

    /// Check if the error was raised before any network call
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ZaplinkError::Config(_)
                | ZaplinkError::NotAuthenticated
                | ZaplinkError::Validation(_)
                | ZaplinkError::Decode(_)
                | ZaplinkError::Storage(_)
        )
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        ZaplinkError::Api {
            code: status.as_u16() as i32,
            message: message.into(),
        }
    }
}

/// Result type alias for Zaplink operations
pub type Result<T> = std::result::Result<T, ZaplinkError>;
