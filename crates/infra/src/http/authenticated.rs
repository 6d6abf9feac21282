//! HTTP client that attaches the session's bearer token

use std::sync::Arc;

use oidc_session_common::auth::{SecureStorage, TokenStore};
use reqwest::{Method, RequestBuilder, Response};

use super::client::HttpClient;
use crate::errors::InfraError;

/// Wraps [`HttpClient`] and adds `Authorization: Bearer <access token>` to
/// every attempt while the token store holds an access token.
///
/// The bearer is applied inside [`AuthenticatedClient::send`], once per
/// attempt, so a request built before a background refresh still goes out
/// with the refreshed token.
pub struct AuthenticatedClient<S: SecureStorage> {
    http: HttpClient,
    tokens: Arc<TokenStore<S>>,
}

impl<S: SecureStorage> Clone for AuthenticatedClient<S> {
    fn clone(&self) -> Self {
        Self { http: self.http.clone(), tokens: Arc::clone(&self.tokens) }
    }
}

impl<S: SecureStorage> AuthenticatedClient<S> {
    /// Share `tokens` with the session that refreshes them
    #[must_use]
    pub fn new(http: HttpClient, tokens: Arc<TokenStore<S>>) -> Self {
        Self { http, tokens }
    }

    /// Start an unauthenticated request; the bearer is added by `send`
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.http.request(method, url)
    }

    /// Send with the access token current at each attempt
    ///
    /// # Errors
    /// Propagates transport failures from [`HttpClient::send_with`].
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, InfraError> {
        self.http.send_with(builder, |request| self.authorize(request)).await
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.tokens.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}
