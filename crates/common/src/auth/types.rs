//! Token material and provider exchange types

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use oidc_session_domain::{Claims, ExtraParameters, SessionState};
use serde::{Deserialize, Serialize};

/// The four token fields, always replaced together
///
/// `expiration` equal to `DateTime::<Utc>::MIN_UTC` is the "unset" sentinel
/// some providers emit and is treated like `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: Option<String>,
    pub identity_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
}

impl TokenBundle {
    /// True iff a non-empty access token is present
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.access_token.as_deref().is_some_and(|token| !token.is_empty())
    }

    /// Expiration usable for scheduling, with the minimum sentinel filtered out
    #[must_use]
    pub fn usable_expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration.filter(|expiration| *expiration != DateTime::<Utc>::MIN_UTC)
    }

    /// Derive the conceptual session state at `now`
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> SessionState {
        if !self.has_access_token() {
            return SessionState::LoggedOut;
        }
        match self.usable_expiration() {
            None => SessionState::Unknown,
            Some(expiration) if expiration < now => SessionState::Expired,
            Some(_) => SessionState::Valid,
        }
    }
}

/// Tokens returned by a successful login or refresh exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTokens {
    pub access_token: String,
    pub identity_token: String,
    pub refresh_token: String,
    pub expiration: Option<DateTime<Utc>>,
}

/// Successful interactive login: tokens plus the identity claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderLogin {
    pub tokens: ProviderTokens,
    #[serde(default)]
    pub claims: Claims,
}

/// Extra parameters passed through to the provider on login
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginRequest {
    pub front_channel_extra_parameters: ExtraParameters,
    pub back_channel_extra_parameters: ExtraParameters,
}

/// Everything the host browser needs to run the interactive login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRequest {
    pub authority: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub front_channel_extra_parameters: ExtraParameters,
    pub back_channel_extra_parameters: ExtraParameters,
}

/// Everything the host browser needs to end the provider session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndSessionRequest {
    pub authority: String,
    pub client_id: String,
    pub post_logout_redirect_uri: String,
}

/// Raw user-info answer; the session manager classifies and deserialises it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

impl ProbeResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Token endpoint response (RFC 6749 §5.1)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Convert into a bundle, keeping `previous_refresh_token` when the
    /// provider did not rotate it.
    #[must_use]
    pub fn into_provider_tokens(
        self,
        previous_refresh_token: &str,
        now: DateTime<Utc>,
    ) -> ProviderTokens {
        // An out-of-range lifetime is treated like no lifetime at all
        let expiration = self
            .expires_in
            .filter(|seconds| *seconds > 0)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime));

        ProviderTokens {
            access_token: self.access_token,
            identity_token: self.id_token.unwrap_or_default(),
            refresh_token: self
                .refresh_token
                .filter(|token| !token.is_empty())
                .unwrap_or_else(|| previous_refresh_token.to_string()),
            expiration,
        }
    }
}

/// OAuth error response (RFC 6749 §5.2)
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}
