//! User-info endpoint probe over HTTP

use async_trait::async_trait;
use oidc_session_common::auth::{ProbeError, ProbeResponse, UserInfoProbe};
use reqwest::Method;
use tracing::debug;

use super::client::HttpClient;
use crate::errors::InfraError;

/// `UserInfoProbe` backed by [`HttpClient`]
///
/// Issues a single bearer GET per call. Any HTTP status counts as an answer;
/// only transport failures become `ProbeError`.
#[derive(Debug, Clone)]
pub struct HttpUserInfoProbe {
    http: HttpClient,
}

impl HttpUserInfoProbe {
    /// Single-attempt client with the default timeout
    ///
    /// # Errors
    /// Returns `InfraError::Http` if the underlying client cannot be built.
    pub fn new() -> Result<Self, InfraError> {
        Ok(Self { http: HttpClient::single_attempt()? })
    }

    /// Use an existing client, for custom timeouts
    #[must_use]
    pub fn with_client(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl UserInfoProbe for HttpUserInfoProbe {
    async fn get(&self, url: &str, access_token: Option<&str>) -> Result<ProbeResponse, ProbeError> {
        let mut request = self.http.request(Method::GET, url);
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        let response = self.http.send(request).await.map_err(|e| ProbeError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| ProbeError(e.to_string()))?;
        debug!(status, "user info probe answered");

        Ok(ProbeResponse::new(status, body))
    }
}
