//! Collaborator capabilities injected into the session manager
//!
//! Each trait isolates one external dependency (secure storage, the network
//! stack, the identity provider, the user-info endpoint, the host browser)
//! so the session state machine can be driven by in-memory doubles in tests.

use async_trait::async_trait;
use oidc_session_domain::ExtraParameters;

use super::error::{ProbeError, ProviderError, StorageError};
use super::types::{
    AuthorizeRequest, EndSessionRequest, LoginRequest, ProbeResponse, ProviderLogin,
    ProviderTokens,
};

/// Persistent key/value storage for token material
///
/// Only string values are stored. A missing key is `Ok(None)`, never an
/// error.
#[async_trait]
pub trait SecureStorage: Send + Sync {
    /// Read a value
    ///
    /// # Errors
    /// Returns `StorageError` if the backend cannot be read
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one
    ///
    /// # Errors
    /// Returns `StorageError` if the backend rejects the write
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value; removing a missing key succeeds
    ///
    /// # Errors
    /// Returns `StorageError` if the backend rejects the removal
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Cheap connectivity precondition checked before every network operation
pub trait NetworkReachability: Send + Sync {
    fn has_internet(&self) -> bool;
}

/// Identity provider operations used by the session manager
#[async_trait]
pub trait IdentityProviderClient: Send + Sync {
    /// Run the interactive authorization flow
    ///
    /// # Errors
    /// Returns `ProviderError` with the provider's message when login fails or
    /// is cancelled
    async fn login(&self, request: &LoginRequest) -> Result<ProviderLogin, ProviderError>;

    /// End the provider session
    ///
    /// # Errors
    /// Returns `ProviderError` when the provider reports a failure
    async fn logout(&self) -> Result<(), ProviderError>;

    /// Exchange a refresh token for a new token bundle
    ///
    /// # Errors
    /// Returns `ProviderError::Rejected` when the provider answers with an
    /// error and `ProviderError::Transport` when no answer was received
    async fn refresh_token(
        &self,
        refresh_token: &str,
        back_channel_extra_parameters: &ExtraParameters,
    ) -> Result<ProviderTokens, ProviderError>;
}

/// Bearer GET against the user-info endpoint
#[async_trait]
pub trait UserInfoProbe: Send + Sync {
    /// Fetch `url`, attaching `access_token` as a bearer credential when
    /// present
    ///
    /// # Errors
    /// Returns `ProbeError` only for transport failures; any HTTP status is a
    /// successful `ProbeResponse`
    async fn get(&self, url: &str, access_token: Option<&str>)
        -> Result<ProbeResponse, ProbeError>;
}

/// Host-provided system browser for the front-channel part of OIDC
///
/// The library never renders UI; the host opens the authorize URL, waits for
/// the redirect to the app's custom scheme and completes the code exchange.
#[async_trait]
pub trait InteractiveBrowser: Send + Sync {
    /// # Errors
    /// Returns `ProviderError::Browser` when the user cancels or the flow fails
    async fn login(&self, request: &AuthorizeRequest) -> Result<ProviderLogin, ProviderError>;

    /// # Errors
    /// Returns `ProviderError::Browser` when the end-session flow fails
    async fn logout(&self, request: &EndSessionRequest) -> Result<(), ProviderError>;
}
