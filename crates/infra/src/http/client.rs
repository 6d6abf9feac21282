use std::time::Duration;

use oidc_session_domain::constants::REQUEST_TIMEOUT_SECS;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::errors::InfraError;

/// Pause before the one retry a transient failure earns
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Thin wrapper over `reqwest` with the request timeout applied and one
/// retry for gateway-style failures.
///
/// Only `502`, `503`, `504` and refused connections are retried. A timeout
/// is not, since the resource server may already have acted on the request.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    attempts: u32,
}

impl HttpClient {
    /// Client with the default timeout and a single retry
    ///
    /// # Errors
    /// Returns `InfraError::Http` if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, InfraError> {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS), 2)
    }

    /// Client that never retries, used for validation calls whose status is
    /// the answer
    ///
    /// # Errors
    /// Returns `InfraError::Http` if the TLS backend cannot be initialised.
    pub fn single_attempt() -> Result<Self, InfraError> {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS), 1)
    }

    /// Client with an explicit timeout and attempt budget
    ///
    /// # Errors
    /// Returns `InfraError::Http` if reqwest rejects the configuration.
    pub fn with_timeout(timeout: Duration, attempts: u32) -> Result<Self, InfraError> {
        let client = ReqwestClient::builder().timeout(timeout).no_proxy().build()?;
        Ok(Self { client, attempts: attempts.max(1) })
    }

    /// Total attempts per `send`, first try included
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Start a request on the shared connection pool
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send `builder` as is
    ///
    /// # Errors
    /// See [`HttpClient::send_with`].
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, InfraError> {
        self.send_with(builder, |request| request).await
    }

    /// Send `builder`, passing every attempt through `prepare` first
    ///
    /// `prepare` runs once per attempt, so headers it derives from shared
    /// state (the bearer token) reflect that state at the moment of sending.
    /// The last response is returned whatever its status.
    ///
    /// # Errors
    /// Returns `InfraError::Internal` if the body cannot be replayed and
    /// `InfraError::Http` when no attempt produced a response.
    pub async fn send_with<F>(
        &self,
        builder: RequestBuilder,
        prepare: F,
    ) -> Result<Response, InfraError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            let replay = builder
                .try_clone()
                .ok_or_else(|| InfraError::Internal("streaming bodies cannot be resent".into()))?;
            let request = prepare(replay).build()?;
            let url = request.url().clone();
            let last = attempt >= self.attempts;

            match self.client.execute(request).await {
                Ok(response) if !last && is_transient_status(response.status()) => {
                    debug!(attempt, %url, status = %response.status(), "retrying HTTP request");
                }
                Ok(response) => return Ok(response),
                Err(err) if !last && err.is_connect() => {
                    debug!(attempt, %url, error = %err, "retrying HTTP request");
                }
                Err(err) => return Err(err.into()),
            }

            tokio::time::sleep(RETRY_DELAY).await;
            attempt += 1;
        }
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}
