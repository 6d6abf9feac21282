//! Outcome records returned by the session manager

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_status_conversions;

/// Identity claims reported by the provider at login
pub type Claims = serde_json::Map<String, serde_json::Value>;

/// Result of validating, refreshing or acquiring a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenResult {
    Valid,
    Expired,
    NoInternet,
    OtherError,
}

impl_status_conversions!(TokenResult {
    Valid => "valid",
    Expired => "expired",
    NoInternet => "no_internet",
    OtherError => "other_error",
});

/// Result of a provider logout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogoutStatus {
    NoInternet,
    Success,
    UnknownError,
}

impl_status_conversions!(LogoutStatus {
    NoInternet => "no_internet",
    Success => "success",
    UnknownError => "unknown_error",
});

/// Classification of a user-info request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserInfoStatus {
    Success,
    Unauthorized,
    ServerError,
    NoInternet,
    OtherError,
}

impl_status_conversions!(UserInfoStatus {
    Success => "success",
    Unauthorized => "unauthorized",
    ServerError => "server_error",
    NoInternet => "no_internet",
    OtherError => "other_error",
});

impl UserInfoStatus {
    /// Map an HTTP status code onto the user-info taxonomy
    #[must_use]
    pub fn from_http_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            401 => Self::Unauthorized,
            500 => Self::ServerError,
            _ => Self::OtherError,
        }
    }
}

/// Result of a refresh-token exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshOutcome {
    Success,
    NoInternet,
    Failed,
}

impl_status_conversions!(RefreshOutcome {
    Success => "success",
    NoInternet => "no_internet",
    Failed => "failed",
});

/// Conceptual session state derived from the token store (never persisted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    LoggedOut,
    Valid,
    Expired,
    Unknown,
}

impl_status_conversions!(SessionState {
    LoggedOut => "logged_out",
    Valid => "valid",
    Expired => "expired",
    Unknown => "unknown",
});

/// Outcome of an interactive login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResult {
    pub result: TokenResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expiration: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Claims>,
}

impl LoginResult {
    #[must_use]
    pub fn failed(result: TokenResult, error_message: Option<String>) -> Self {
        Self { result, error_message, token_expiration: None, user: None }
    }

    #[must_use]
    pub fn valid(token_expiration: Option<DateTime<Utc>>, user: Claims) -> Self {
        Self { result: TokenResult::Valid, error_message: None, token_expiration, user: Some(user) }
    }
}

/// Outcome of a logout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResult {
    pub status: LogoutStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogoutResult {
    #[must_use]
    pub fn new(status: LogoutStatus, error_message: Option<String>) -> Self {
        Self { status, error_message }
    }
}

/// User-info payload of the caller's chosen shape plus its classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfoResult<T> {
    pub status: UserInfoStatus,
    pub value: Option<T>,
}

impl<T> UserInfoResult<T> {
    #[must_use]
    pub fn new(status: UserInfoStatus, value: Option<T>) -> Self {
        Self { status, value }
    }

    #[must_use]
    pub fn status_only(status: UserInfoStatus) -> Self {
        Self { status, value: None }
    }
}
