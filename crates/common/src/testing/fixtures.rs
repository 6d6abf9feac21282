//! Token and login fixtures

use chrono::{DateTime, Duration, Utc};
use oidc_session_domain::Claims;
use serde_json::json;

use crate::auth::{ProviderLogin, ProviderTokens};

/// Tokens suffixed with `tag` that expire `lifetime` after `now`
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-utils")]
/// # {
/// use chrono::{Duration, Utc};
/// use oidc_session_common::testing::fixtures::tokens_expiring_in;
///
/// let tokens = tokens_expiring_in("2", Utc::now(), Duration::minutes(10));
/// assert_eq!(tokens.access_token, "access-2");
/// assert_eq!(tokens.refresh_token, "refresh-2");
/// # }
/// ```
#[must_use]
pub fn tokens_expiring_in(tag: &str, now: DateTime<Utc>, lifetime: Duration) -> ProviderTokens {
    ProviderTokens {
        access_token: format!("access-{tag}"),
        identity_token: format!("identity-{tag}"),
        refresh_token: format!("refresh-{tag}"),
        expiration: Some(now + lifetime),
    }
}

/// Identity claims for a named test user
#[must_use]
pub fn user_claims(name: &str) -> Claims {
    let value = json!({
        "sub": format!("auth0|{name}"),
        "name": name,
        "email": format!("{name}@example.com"),
    });
    match value {
        serde_json::Value::Object(map) => map,
        _ => Claims::new(),
    }
}

/// Successful login carrying `tokens` and claims for `name`
#[must_use]
pub fn login_for(name: &str, tokens: ProviderTokens) -> ProviderLogin {
    ProviderLogin { tokens, claims: user_claims(name) }
}
