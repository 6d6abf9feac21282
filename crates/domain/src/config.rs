//! Identity provider and API configuration
//!
//! Loaded once at startup and shared immutably (`Arc<AuthConfig>`) for the
//! lifetime of the process. Keys are PascalCase so the same layered settings
//! files can be read from JSON or TOML.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::APP_PROTOCOL_NAME;
use crate::errors::{Result, SessionError};

/// Extra name/value pairs forwarded to the provider on the front or back
/// channel (e.g. Auth0's `audience`).
pub type ExtraParameters = BTreeMap<String, String>;

/// Root settings document; the auth section lives under `Auth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    pub auth: AuthConfig,
}

/// Authentication configuration for the app and its backend API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthConfig {
    /// Base URL of the protected backend API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Host part of the redirect URI registered with the provider
    pub app_callback_url: String,

    pub oidc: OidcConfig,
}

/// OpenID Connect provider settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OidcConfig {
    /// Provider authority (e.g. `https://tenant.eu.auth0.com`)
    pub authority: String,

    pub client_id: String,

    pub scopes: Vec<String>,

    /// User-info endpoint used as the access token liveness probe
    pub user_info_url: String,

    /// Explicit token endpoint; defaults to `<authority>/oauth/token`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_channel_extra_parameters: Option<ExtraParameters>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_channel_extra_parameters: Option<ExtraParameters>,
}

impl AuthConfig {
    /// Redirect URI used for both login and post-logout callbacks
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{APP_PROTOCOL_NAME}://{}/", self.app_callback_url)
    }

    /// Check that every field the session manager relies on is present.
    ///
    /// # Errors
    /// Returns `SessionError::Config` naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        require("AppCallbackUrl", &self.app_callback_url)?;
        self.oidc.validate()
    }
}

impl OidcConfig {
    /// Scopes as a space-separated string
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Token endpoint for the refresh-token grant
    #[must_use]
    pub fn token_url(&self) -> String {
        match &self.token_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("{}/oauth/token", self.authority.trim_end_matches('/')),
        }
    }

    /// Front-channel extras, empty when not configured
    #[must_use]
    pub fn front_channel_parameters(&self) -> ExtraParameters {
        self.front_channel_extra_parameters.clone().unwrap_or_default()
    }

    /// Back-channel extras, empty when not configured
    #[must_use]
    pub fn back_channel_parameters(&self) -> ExtraParameters {
        self.back_channel_extra_parameters.clone().unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        require("Oidc.Authority", &self.authority)?;
        require("Oidc.ClientId", &self.client_id)?;
        require("Oidc.UserInfoUrl", &self.user_info_url)?;
        if self.scopes.iter().all(|scope| scope.trim().is_empty()) {
            return Err(SessionError::Config("Oidc.Scopes must not be empty".to_string()));
        }
        Ok(())
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SessionError::Config(format!("{name} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuthConfig {
        AuthConfig {
            api_url: Some("https://api.example.com".to_string()),
            app_callback_url: "callback".to_string(),
            oidc: OidcConfig {
                authority: "https://tenant.eu.auth0.com/".to_string(),
                client_id: "client123".to_string(),
                scopes: vec!["openid".to_string(), "offline_access".to_string()],
                user_info_url: "https://tenant.eu.auth0.com/userinfo".to_string(),
                token_endpoint: None,
                front_channel_extra_parameters: Some(BTreeMap::from([(
                    "audience".to_string(),
                    "api.example.com".to_string(),
                )])),
                back_channel_extra_parameters: None,
            },
        }
    }

    #[test]
    fn derives_redirect_uri_from_callback_host() {
        assert_eq!(sample().redirect_uri(), "oidcsession://callback/");
    }

    #[test]
    fn token_url_defaults_to_authority() {
        let config = sample();
        assert_eq!(config.oidc.token_url(), "https://tenant.eu.auth0.com/oauth/token");
        assert_eq!(config.oidc.scope_string(), "openid offline_access");
    }

    #[test]
    fn explicit_token_endpoint_wins() {
        let mut config = sample();
        config.oidc.token_endpoint = Some("https://login.example.com/token".to_string());
        assert_eq!(config.oidc.token_url(), "https://login.example.com/token");
    }

    #[test]
    fn missing_extras_are_empty() {
        let config = sample();
        assert_eq!(config.oidc.front_channel_parameters().len(), 1);
        assert!(config.oidc.back_channel_parameters().is_empty());
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert!(sample().validate().is_ok());

        let mut config = sample();
        config.oidc.client_id = "  ".to_string();
        assert_eq!(
            config.validate(),
            Err(SessionError::Config("Oidc.ClientId must not be empty".to_string()))
        );

        let mut config = sample();
        config.oidc.scopes.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_pascal_case_settings() {
        let json = r#"{
            "Auth": {
                "AppCallbackUrl": "callback",
                "Oidc": {
                    "Authority": "https://tenant.eu.auth0.com",
                    "ClientId": "abc",
                    "Scopes": ["openid"],
                    "UserInfoUrl": "https://tenant.eu.auth0.com/userinfo",
                    "BackChannelExtraParameters": { "audience": "api" }
                }
            }
        }"#;

        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.auth.api_url, None);
        assert_eq!(settings.auth.oidc.client_id, "abc");
        assert_eq!(
            settings.auth.oidc.back_channel_parameters().get("audience").map(String::as_str),
            Some("api")
        );
    }
}
