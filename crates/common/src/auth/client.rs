//! OIDC client: browser-delegated login/logout plus the refresh-token grant
//!
//! The front channel (authorize, end-session) runs in the host's system
//! browser through an [`InteractiveBrowser`]. The back channel refresh is a
//! plain RFC 6749 §6 form POST to the token endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use oidc_session_domain::constants::{MAX_ERROR_BODY_LENGTH, REQUEST_TIMEOUT_SECS};
use oidc_session_domain::{AuthConfig, ExtraParameters};
use reqwest::Client;
use tracing::{debug, warn};

use super::error::ProviderError;
use super::traits::{IdentityProviderClient, InteractiveBrowser};
use super::types::{
    AuthorizeRequest, EndSessionRequest, LoginRequest, OAuthErrorBody, ProviderLogin,
    ProviderTokens, TokenResponse,
};

/// Identity provider client for a configured OIDC authority
pub struct OidcClient<B: InteractiveBrowser> {
    config: Arc<AuthConfig>,
    browser: Arc<B>,
    http: Client,
}

impl<B: InteractiveBrowser> OidcClient<B> {
    /// Client with the default request timeout
    ///
    /// # Errors
    /// Returns the `reqwest` error if the TLS backend cannot be initialised.
    pub fn new(config: Arc<AuthConfig>, browser: Arc<B>) -> Result<Self, reqwest::Error> {
        let http =
            Client::builder().timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS)).build()?;
        Ok(Self::with_http_client(config, browser, http))
    }

    /// Use a caller-supplied `reqwest` client (proxies, custom TLS roots)
    #[must_use]
    pub fn with_http_client(config: Arc<AuthConfig>, browser: Arc<B>, http: Client) -> Self {
        Self { config, browser, http }
    }

    /// Configuration the requests are built from
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn authorize_request(&self, request: &LoginRequest) -> AuthorizeRequest {
        let oidc = &self.config.oidc;
        AuthorizeRequest {
            authority: oidc.authority.clone(),
            client_id: oidc.client_id.clone(),
            redirect_uri: self.config.redirect_uri(),
            scope: oidc.scope_string(),
            front_channel_extra_parameters: request.front_channel_extra_parameters.clone(),
            back_channel_extra_parameters: request.back_channel_extra_parameters.clone(),
        }
    }

    fn end_session_request(&self) -> EndSessionRequest {
        EndSessionRequest {
            authority: self.config.oidc.authority.clone(),
            client_id: self.config.oidc.client_id.clone(),
            post_logout_redirect_uri: self.config.redirect_uri(),
        }
    }
}

#[async_trait]
impl<B: InteractiveBrowser> IdentityProviderClient for OidcClient<B> {
    async fn login(&self, request: &LoginRequest) -> Result<ProviderLogin, ProviderError> {
        self.browser.login(&self.authorize_request(request)).await
    }

    async fn logout(&self) -> Result<(), ProviderError> {
        self.browser.logout(&self.end_session_request()).await
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
        back_channel_extra_parameters: &ExtraParameters,
    ) -> Result<ProviderTokens, ProviderError> {
        if refresh_token.is_empty() {
            return Err(ProviderError::Rejected("No refresh token available".to_string()));
        }

        let mut params = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("client_id".to_string(), self.config.oidc.client_id.clone()),
            ("refresh_token".to_string(), refresh_token.to_string()),
        ];
        params.extend(back_channel_extra_parameters.iter().map(|(k, v)| (k.clone(), v.clone())));

        let token_url = self.config.oidc.token_url();
        debug!(url = %token_url, "Requesting token refresh");

        let response = self
            .http
            .post(&token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Token endpoint rejected refresh");
            return Err(match serde_json::from_str::<OAuthErrorBody>(&body) {
                Ok(error) => ProviderError::Rejected(error.to_string()),
                Err(_) => ProviderError::Rejected(format!(
                    "{}: {}",
                    status.as_u16(),
                    truncate(&body, MAX_ERROR_BODY_LENGTH)
                )),
            });
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(token_response.into_provider_tokens(refresh_token, Utc::now()))
    }
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}
