//! In-memory collaborators for session tests
//!
//! Each mock records what it was asked to do and answers from configurable
//! canned results, so tests can drive the session manager through every
//! branch without a network or an OS keychain.

// Allow missing error/panic docs for test mocks - they are designed to be simple
// and errors are clearly indicated by their return types
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use oidc_session_domain::ExtraParameters;

use crate::auth::{
    IdentityProviderClient, LoginRequest, NetworkReachability, ProbeError, ProbeResponse,
    ProviderError, ProviderLogin, ProviderTokens, SecureStorage, StorageError, UserInfoProbe,
};

type StorageData = Arc<Mutex<HashMap<String, String>>>;

/// Secure storage held in a `HashMap`
///
/// `set_failing(true)` makes every operation return
/// `StorageError::AccessFailed`.
#[derive(Debug, Clone, Default)]
pub struct MockSecureStorage {
    data: StorageData,
    failing: Arc<AtomicBool>,
}

impl MockSecureStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Seed a value directly, bypassing the failure switch
    pub fn insert(&self, key: &str, value: &str) {
        // SAFETY: Mutex poisoning is acceptable in test mocks
        self.data.lock().unwrap().insert(key.to_string(), value.to_string());
    }

    #[must_use]
    pub fn value(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    /// Stored keys, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn check(&self, key: &str) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::access_failed(key, "mock storage failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SecureStorage for MockSecureStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check(key)?;
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check(key)?;
        self.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check(key)?;
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Reachability answer controlled by the test
#[derive(Debug, Default)]
pub struct StaticReachability {
    online: AtomicBool,
}

impl StaticReachability {
    pub fn new(online: bool) -> Self {
        Self { online: AtomicBool::new(online) }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl NetworkReachability for StaticReachability {
    fn has_internet(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Identity provider with canned results and call counters
///
/// Refresh results are consumed in order; once the queue is empty every
/// refresh is rejected with `invalid_grant`.
#[derive(Debug)]
pub struct MockIdentityProvider {
    login_result: Mutex<Result<ProviderLogin, ProviderError>>,
    logout_result: Mutex<Result<(), ProviderError>>,
    refresh_results: Mutex<VecDeque<Result<ProviderTokens, ProviderError>>>,
    refresh_latency: Mutex<Option<Duration>>,
    refresh_tokens_seen: Mutex<Vec<String>>,
    login_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self {
            login_result: Mutex::new(Err(ProviderError::Browser("UserCancel".to_string()))),
            logout_result: Mutex::new(Ok(())),
            refresh_results: Mutex::new(VecDeque::new()),
            refresh_latency: Mutex::new(None),
            refresh_tokens_seen: Mutex::new(Vec::new()),
            login_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
        }
    }
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_login_result(&self, result: Result<ProviderLogin, ProviderError>) {
        *self.login_result.lock().unwrap() = result;
    }

    pub fn set_logout_result(&self, result: Result<(), ProviderError>) {
        *self.logout_result.lock().unwrap() = result;
    }

    /// Queue the answer for the next refresh call
    pub fn push_refresh_result(&self, result: Result<ProviderTokens, ProviderError>) {
        self.refresh_results.lock().unwrap().push_back(result);
    }

    /// Make each refresh call take `latency` before answering
    pub fn set_refresh_latency(&self, latency: Duration) {
        *self.refresh_latency.lock().unwrap() = Some(latency);
    }

    #[must_use]
    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Refresh tokens presented to the provider, in call order
    #[must_use]
    pub fn refresh_tokens_seen(&self) -> Vec<String> {
        self.refresh_tokens_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProviderClient for MockIdentityProvider {
    async fn login(&self, _request: &LoginRequest) -> Result<ProviderLogin, ProviderError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_result.lock().unwrap().clone()
    }

    async fn logout(&self) -> Result<(), ProviderError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.logout_result.lock().unwrap().clone()
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
        _back_channel_extra_parameters: &ExtraParameters,
    ) -> Result<ProviderTokens, ProviderError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens_seen.lock().unwrap().push(refresh_token.to_string());

        let latency = *self.refresh_latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.refresh_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Rejected("invalid_grant".to_string())))
    }
}

/// User-info endpoint with a queue of answers and a fallback answer
#[derive(Debug)]
pub struct MockUserInfoProbe {
    queued: Mutex<VecDeque<Result<ProbeResponse, ProbeError>>>,
    fallback: Mutex<Result<ProbeResponse, ProbeError>>,
    tokens_seen: Mutex<Vec<Option<String>>>,
    calls: AtomicUsize,
}

impl Default for MockUserInfoProbe {
    fn default() -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Ok(ProbeResponse::new(200, "{}"))),
            tokens_seen: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MockUserInfoProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every unqueued call with `status` and `body`
    pub fn respond_with(&self, status: u16, body: &str) {
        *self.fallback.lock().unwrap() = Ok(ProbeResponse::new(status, body));
    }

    /// Fail every unqueued call at the transport level
    pub fn fail_with(&self, message: &str) {
        *self.fallback.lock().unwrap() = Err(ProbeError(message.to_string()));
    }

    /// Answer the next call with `status` and `body`
    pub fn push_response(&self, status: u16, body: &str) {
        self.queued.lock().unwrap().push_back(Ok(ProbeResponse::new(status, body)));
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Bearer tokens presented, in call order
    #[must_use]
    pub fn tokens_seen(&self) -> Vec<Option<String>> {
        self.tokens_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserInfoProbe for MockUserInfoProbe {
    async fn get(
        &self,
        _url: &str,
        access_token: Option<&str>,
    ) -> Result<ProbeResponse, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens_seen.lock().unwrap().push(access_token.map(str::to_string));

        let queued = self.queued.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }
}
