//! `SecureStorage` over the platform keychain
//!
//! `security::keychain` holds the generic secret wrapper; this module adapts
//! it to the token store's storage contract so the security module never
//! depends on auth types.

use async_trait::async_trait;

use super::error::StorageError;
use super::traits::SecureStorage;
use crate::security::{KeychainError, KeychainProvider};

impl From<KeychainError> for StorageError {
    fn from(err: KeychainError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[async_trait]
impl SecureStorage for KeychainProvider {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.get_secret(key).map_err(|e| StorageError::access_failed(key, e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_secret(key, value).map_err(|e| StorageError::access_failed(key, e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.delete_secret(key).map_err(|e| StorageError::access_failed(key, e.to_string()))
    }
}
