//! Token store backed by secure storage
//!
//! Keeps the current token bundle in memory and mirrors every change to a
//! [`SecureStorage`] backend under four fixed keys. The in-memory bundle is
//! always replaced as a whole, so readers never observe a mix of old and new
//! fields.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use oidc_session_domain::constants::{
    ACCESS_TOKEN_EXPIRATION_KEY, ACCESS_TOKEN_KEY, IDENTITY_TOKEN_KEY, REFRESH_TOKEN_KEY,
    TOKEN_STORAGE_KEYS,
};
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::error::StorageError;
use super::traits::SecureStorage;
use super::types::{ProviderTokens, TokenBundle};

/// Single source of truth for the current token bundle
pub struct TokenStore<S: SecureStorage> {
    storage: Arc<S>,
    current: RwLock<TokenBundle>,
}

impl<S: SecureStorage> TokenStore<S> {
    /// Create an empty store over `storage`; call [`TokenStore::load`] to
    /// pick up a persisted session.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage, current: RwLock::new(TokenBundle::default()) }
    }

    /// Read the four persisted fields into memory
    ///
    /// Returns `true` when a non-empty access token was found. An unparseable
    /// expiration is treated as absent. Without an access token the in-memory
    /// bundle is cleared.
    ///
    /// # Errors
    /// Returns `StorageError` if any key cannot be read
    pub async fn load(&self) -> Result<bool, StorageError> {
        let access_token = non_empty(self.storage.get(ACCESS_TOKEN_KEY).await?);
        if access_token.is_none() {
            debug!("No persisted access token");
            *self.current.write() = TokenBundle::default();
            return Ok(false);
        }

        let identity_token = non_empty(self.storage.get(IDENTITY_TOKEN_KEY).await?);
        let refresh_token = non_empty(self.storage.get(REFRESH_TOKEN_KEY).await?);
        let expiration = self
            .storage
            .get(ACCESS_TOKEN_EXPIRATION_KEY)
            .await?
            .and_then(|raw| parse_expiration(&raw));

        *self.current.write() =
            TokenBundle { access_token, identity_token, refresh_token, expiration };

        debug!(expiration = ?expiration, "Loaded persisted session");
        Ok(true)
    }

    /// Replace the bundle in memory and persist each field
    ///
    /// Empty values remove their storage key. Memory is updated before the
    /// writes, so a storage failure leaves memory ahead of storage.
    ///
    /// # Errors
    /// Returns the first `StorageError` raised while persisting
    pub async fn save(
        &self,
        access_token: &str,
        identity_token: &str,
        refresh_token: &str,
        expiration: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        *self.current.write() = TokenBundle {
            access_token: non_empty(Some(access_token.to_string())),
            identity_token: non_empty(Some(identity_token.to_string())),
            refresh_token: non_empty(Some(refresh_token.to_string())),
            expiration,
        };

        let expiration_text = expiration.map(|at| at.to_rfc3339()).unwrap_or_default();

        self.persist(ACCESS_TOKEN_KEY, access_token).await?;
        self.persist(IDENTITY_TOKEN_KEY, identity_token).await?;
        self.persist(REFRESH_TOKEN_KEY, refresh_token).await?;
        self.persist(ACCESS_TOKEN_EXPIRATION_KEY, &expiration_text).await?;

        debug!(expiration = ?expiration, "Saved token bundle");
        Ok(())
    }

    /// Save the result of a login or refresh exchange
    ///
    /// # Errors
    /// Returns the first `StorageError` raised while persisting
    pub async fn save_tokens(&self, tokens: &ProviderTokens) -> Result<(), StorageError> {
        self.save(
            &tokens.access_token,
            &tokens.identity_token,
            &tokens.refresh_token,
            tokens.expiration,
        )
        .await
    }

    /// Clear memory and remove all four keys
    ///
    /// Every removal is attempted even if an earlier one fails.
    ///
    /// # Errors
    /// Returns the first `StorageError` raised while removing
    pub async fn clear(&self) -> Result<(), StorageError> {
        *self.current.write() = TokenBundle::default();

        let mut first_error = None;
        for key in TOKEN_STORAGE_KEYS {
            if let Err(err) = self.storage.remove(key).await {
                warn!(key = key, error = %err, "Failed to remove token from storage");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Current access token
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.current.read().access_token.clone()
    }

    /// Current identity token
    #[must_use]
    pub fn identity_token(&self) -> Option<String> {
        self.current.read().identity_token.clone()
    }

    /// Current refresh token
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.current.read().refresh_token.clone()
    }

    /// Access token expiration as stored, sentinel included
    #[must_use]
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.current.read().expiration
    }

    /// True iff a non-empty access token is held
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.current.read().has_access_token()
    }

    /// Consistent copy of all four fields
    #[must_use]
    pub fn snapshot(&self) -> TokenBundle {
        self.current.read().clone()
    }

    async fn persist(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if value.trim().is_empty() {
            self.storage.remove(key).await
        } else {
            self.storage.set(key, value).await
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_expiration(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(err) => {
            warn!(value = raw, error = %err, "Ignoring unparseable token expiration");
            None
        }
    }
}
