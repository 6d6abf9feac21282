//! Infrastructure errors and their conversion into the domain error

use oidc_session_domain::SessionError;
use thiserror::Error;

/// Failure in HTTP, file or configuration plumbing
#[derive(Debug, Error)]
pub enum InfraError {
    /// The request never produced a response
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("An error occurred during the request: {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Internal(String),
}

impl InfraError {
    /// Build a status error from an HTTP status code
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

impl From<InfraError> for SessionError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::Http(e) => SessionError::Network(e.to_string()),
            InfraError::Status { .. } => SessionError::Network(err.to_string()),
            InfraError::Url(e) => SessionError::Config(format!("Invalid URL: {e}")),
            InfraError::Config(message) => SessionError::Config(message),
            InfraError::Io(e) => SessionError::Internal(e.to_string()),
            InfraError::Json(e) => SessionError::Serialization(e.to_string()),
            InfraError::Toml(e) => SessionError::Serialization(e.to_string()),
            InfraError::Internal(message) => SessionError::Internal(message),
        }
    }
}
