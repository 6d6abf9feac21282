//! Platform keychain access
//!
//! Thin wrapper over the `keyring` crate for string secrets: macOS Keychain,
//! Windows Credential Manager and the Linux Secret Service. Every secret is
//! stored under one service name with the logical key as the account.
//!
//! ## Usage
//!
//! ```no_run
//! use oidc_session_common::security::KeychainProvider;
//!
//! let keychain = KeychainProvider::new("oidc-session");
//! keychain.set_secret("authentication.access_token", "eyJhbGciOi...")?;
//! let token = keychain.get_secret("authentication.access_token")?;
//! assert_eq!(token.as_deref(), Some("eyJhbGciOi..."));
//! # Ok::<(), oidc_session_common::security::KeychainError>(())
//! ```

use keyring::Entry;
use thiserror::Error;
use tracing::debug;

/// Keychain-backed secret storage for one service name
#[derive(Debug, Clone)]
pub struct KeychainProvider {
    service_name: String,
}

impl KeychainProvider {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { service_name: service_name.into() }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Store a secret, replacing any previous value
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the keychain rejects the write
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Storing secret in keychain");

        let entry = self.create_entry(key)?;
        entry.set_password(value).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to store secret for {key}: {e}"))
        })
    }

    /// Read a secret; a missing entry is `Ok(None)`
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the keychain cannot be read
    pub fn get_secret(&self, key: &str) -> Result<Option<String>, KeychainError> {
        debug!(service = %self.service_name, key = %key, "Retrieving secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeychainError::AccessFailed(format!(
                "Failed to retrieve secret for {key}: {e}"
            ))),
        }
    }

    /// Delete a secret; deleting a missing entry succeeds
    ///
    /// # Errors
    /// Returns `KeychainError::AccessFailed` if the keychain rejects the removal
    pub fn delete_secret(&self, key: &str) -> Result<(), KeychainError> {
        debug!(service = %self.service_name, key = %key, "Deleting secret from keychain");

        let entry = self.create_entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::AccessFailed(format!(
                "Failed to delete secret for {key}: {e}"
            ))),
        }
    }

    fn create_entry(&self, key: &str) -> Result<Entry, KeychainError> {
        Entry::new(&self.service_name, key).map_err(|e| {
            KeychainError::AccessFailed(format!("Failed to create keychain entry: {e}"))
        })
    }
}

/// Keychain error types
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Keychain access failed (permission denied, locked, no backend)
    #[error("Keychain access failed: {0}")]
    AccessFailed(String),

    /// Underlying keyring library error
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}
