//! Session constants
//!
//! Storage key names and refresh timing values shared by the token store and
//! the refresh scheduler.

// Secure storage keys
pub const ACCESS_TOKEN_KEY: &str = "authentication.access_token";
pub const IDENTITY_TOKEN_KEY: &str = "authentication.identity_token";
pub const REFRESH_TOKEN_KEY: &str = "authentication.refresh_token";
pub const ACCESS_TOKEN_EXPIRATION_KEY: &str = "authentication.access_token_expiration";

/// All persisted keys, in the order they are written.
pub const TOKEN_STORAGE_KEYS: [&str; 4] =
    [ACCESS_TOKEN_KEY, IDENTITY_TOKEN_KEY, REFRESH_TOKEN_KEY, ACCESS_TOKEN_EXPIRATION_KEY];

/// Default keychain service name.
pub const DEFAULT_KEYCHAIN_SERVICE: &str = "oidc-session";

/// URI scheme the host registers for redirect callbacks.
pub const APP_PROTOCOL_NAME: &str = "oidcsession";

// Refresh scheduling
/// Margin shaved off the remaining token lifetime before refreshing.
pub const REFRESH_MARGIN_MS: i64 = 60_000;
/// Floor applied when the computed refresh delay is not positive.
pub const MIN_REFRESH_DELAY_MS: u64 = 1_000;

// HTTP
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Longest error body kept in messages surfaced to the caller.
pub const MAX_ERROR_BODY_LENGTH: usize = 500;
