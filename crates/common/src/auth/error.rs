//! Error types for session collaborators

use oidc_session_domain::SessionError;
use thiserror::Error;

/// Secure storage failure surfaced by the token store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The backing store rejected the operation
    #[error("Secure storage access failed for {key}: {message}")]
    AccessFailed { key: String, message: String },

    /// The backing store is not usable at all (locked, missing backend)
    #[error("Secure storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn access_failed(key: &str, message: impl Into<String>) -> Self {
        Self::AccessFailed { key: key.to_string(), message: message.into() }
    }
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Identity provider failure during login, logout or refresh
///
/// `Display` yields the provider's message verbatim so hosts can show it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider answered with an error (e.g. `invalid_grant`)
    #[error("{0}")]
    Rejected(String),

    /// The request never produced a provider answer
    #[error("{0}")]
    Transport(String),

    /// The provider answered with something unparseable
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// The host's interactive browser flow failed or was cancelled
    #[error("{0}")]
    Browser(String),
}

impl From<ProviderError> for SessionError {
    fn from(err: ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}

/// Transport failure while probing the user-info endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("User info request failed: {0}")]
pub struct ProbeError(pub String);
