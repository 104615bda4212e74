//! Error types for the API client.

use pos_core::PosError;
use thiserror::Error;

/// Errors that can occur while talking to the product/purchase API.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure (connection refused, timeout, TLS)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("API error: status {status}, {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body, or a placeholder if it could not be read
        message: String,
    },

    /// Response body was not the expected JSON
    #[error("failed to parse response from {endpoint}: {message}")]
    ParseError {
        /// Endpoint that produced the body
        endpoint: String,
        /// Error message
        message: String,
    },

    /// Request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ClientError> for PosError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::InvalidRequest(message) => PosError::Validation(message),
            other => PosError::Network(other.to_string()),
        }
    }
}

/// Result type alias for API client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
