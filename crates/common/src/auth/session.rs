//! Session manager: the validate / refresh / logout state machine
//!
//! Owns the refresh timer and serialises every transition that writes the
//! token bundle (refresh commit, login commit, logout commit) through one
//! async mutex, so a timer-driven refresh and a user action never interleave
//! their writes. The last committed transition wins.

use std::sync::Arc;

use chrono::Utc;
use oidc_session_domain::{
    AuthConfig, LoginResult, LogoutResult, LogoutStatus, RefreshOutcome, SessionState,
    TokenResult, UserInfoResult, UserInfoStatus,
};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::error::StorageError;
use super::scheduler::{is_past_half_life, refresh_delay, RefreshTimer};
use super::token_store::TokenStore;
use super::traits::{IdentityProviderClient, NetworkReachability, SecureStorage, UserInfoProbe};
use super::types::LoginRequest;

/// Orchestrates the token lifecycle for the single session of the process
///
/// Cloning is cheap and every clone drives the same session. Dropping the
/// last clone cancels any pending refresh.
pub struct SessionManager<P, U, S>
where
    P: IdentityProviderClient + 'static,
    U: UserInfoProbe + 'static,
    S: SecureStorage + 'static,
{
    inner: Arc<SessionInner<P, U, S>>,
}

impl<P, U, S> Clone for SessionManager<P, U, S>
where
    P: IdentityProviderClient + 'static,
    U: UserInfoProbe + 'static,
    S: SecureStorage + 'static,
{
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

struct SessionInner<P, U, S>
where
    P: IdentityProviderClient + 'static,
    U: UserInfoProbe + 'static,
    S: SecureStorage + 'static,
{
    config: Arc<AuthConfig>,
    store: Arc<TokenStore<S>>,
    provider: Arc<P>,
    probe: Arc<U>,
    network: Arc<dyn NetworkReachability>,
    timer: RefreshTimer,
    transition: Mutex<()>,
}

impl<P, U, S> Drop for SessionInner<P, U, S>
where
    P: IdentityProviderClient + 'static,
    U: UserInfoProbe + 'static,
    S: SecureStorage + 'static,
{
    fn drop(&mut self) {
        self.timer.disarm();
    }
}

impl<P, U, S> SessionManager<P, U, S>
where
    P: IdentityProviderClient + 'static,
    U: UserInfoProbe + 'static,
    S: SecureStorage + 'static,
{
    /// Wire the manager to its collaborators
    ///
    /// Nothing is loaded or scheduled until [`SessionManager::initialize`].
    pub fn new(
        config: Arc<AuthConfig>,
        store: Arc<TokenStore<S>>,
        provider: Arc<P>,
        probe: Arc<U>,
        network: Arc<dyn NetworkReachability>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                store,
                provider,
                probe,
                network,
                timer: RefreshTimer::new(),
                transition: Mutex::new(()),
            }),
        }
    }

    /// Load the persisted session and arm the refresh timer for it
    ///
    /// Returns whether a persisted access token was found.
    ///
    /// # Errors
    /// Returns the storage error if the persisted session cannot be read
    pub async fn initialize(&self) -> Result<bool, StorageError> {
        let _guard = self.inner.transition.lock().await;
        let found = self.inner.store.load().await?;
        self.inner.schedule_next_refresh();
        info!(found, "Session initialized");
        Ok(found)
    }

    /// Check the current access token, refreshing or logging out as needed
    ///
    /// Intended for app start and resume.
    pub async fn validate_token(&self) -> TokenResult {
        let inner = &self.inner;
        if !inner.ensure_network() {
            return TokenResult::NoInternet;
        }

        let snapshot = inner.store.snapshot();
        if !snapshot.has_access_token() {
            warn!("Access token is missing");
            return TokenResult::OtherError;
        }

        let expired = match snapshot.usable_expiration() {
            None => true,
            Some(expiration) => expiration < Utc::now(),
        };
        if expired {
            info!("Access token has expired or has no expiration");
            return inner.refresh_or_logout(snapshot.refresh_token).await;
        }

        let probe: UserInfoResult<serde_json::Value> = inner.get_user_info().await;
        if probe.status == UserInfoStatus::Unauthorized {
            info!("User info rejected the access token, attempting refresh");
            return inner.refresh_or_logout(snapshot.refresh_token).await;
        }

        inner.schedule_next_refresh();
        TokenResult::Valid
    }

    /// Fetch the user-info document, deserialised into `T`
    pub async fn get_user_info<T: DeserializeOwned>(&self) -> UserInfoResult<T> {
        self.inner.get_user_info().await
    }

    /// Run the interactive login and persist the resulting session
    pub async fn try_login(&self) -> LoginResult {
        let inner = &self.inner;
        if !inner.ensure_network() {
            return LoginResult::failed(TokenResult::NoInternet, None);
        }

        let request = LoginRequest {
            front_channel_extra_parameters: inner.config.oidc.front_channel_parameters(),
            back_channel_extra_parameters: inner.config.oidc.back_channel_parameters(),
        };

        let login = match inner.provider.login(&request).await {
            Ok(login) => login,
            Err(err) => {
                error!(error = %err, "Login failed");
                return LoginResult::failed(TokenResult::OtherError, Some(err.to_string()));
            }
        };

        let _guard = inner.transition.lock().await;
        if let Err(err) = inner.store.save_tokens(&login.tokens).await {
            error!(error = %err, "Failed to persist login tokens");
            inner.set_logged_out().await;
            return LoginResult::failed(TokenResult::OtherError, Some(err.to_string()));
        }
        inner.schedule_next_refresh();

        info!("Login successful");
        LoginResult::valid(login.tokens.expiration, login.claims)
    }

    /// End the provider session and clear local tokens
    ///
    /// A provider failure leaves the local session untouched.
    pub async fn try_logout(&self) -> LogoutResult {
        let inner = &self.inner;
        if !inner.ensure_network() {
            return LogoutResult::new(LogoutStatus::NoInternet, None);
        }

        if let Err(err) = inner.provider.logout().await {
            error!(error = %err, "Logout failed");
            return LogoutResult::new(LogoutStatus::UnknownError, Some(err.to_string()));
        }

        let _guard = inner.transition.lock().await;
        inner.set_logged_out().await;
        info!("Logout successful");
        LogoutResult::new(LogoutStatus::Success, None)
    }

    /// True iff an access token is present; no expiry or network check
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.store.has_access_token()
    }

    /// Conceptual session state derived from the token store
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.store.snapshot().state_at(Utc::now())
    }

    /// True while a background refresh timer is pending
    #[must_use]
    pub fn is_refresh_scheduled(&self) -> bool {
        self.inner.timer.is_armed()
    }

    /// Delay the pending refresh was scheduled with
    #[must_use]
    pub fn scheduled_refresh_delay(&self) -> Option<std::time::Duration> {
        self.inner.timer.scheduled_delay()
    }

    /// Shared token store, for clients that attach the bearer
    #[must_use]
    pub fn token_store(&self) -> &Arc<TokenStore<S>> {
        &self.inner.store
    }
}

impl<P, U, S> SessionInner<P, U, S>
where
    P: IdentityProviderClient + 'static,
    U: UserInfoProbe + 'static,
    S: SecureStorage + 'static,
{
    fn ensure_network(&self) -> bool {
        if self.network.has_internet() {
            return true;
        }
        warn!("No network access available");
        false
    }

    async fn get_user_info<T: DeserializeOwned>(&self) -> UserInfoResult<T> {
        if !self.ensure_network() {
            return UserInfoResult::status_only(UserInfoStatus::NoInternet);
        }

        let access_token = self.store.access_token();
        let response =
            match self.probe.get(&self.config.oidc.user_info_url, access_token.as_deref()).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(error = %err, "User info request did not complete");
                    return UserInfoResult::status_only(UserInfoStatus::OtherError);
                }
            };

        let status = UserInfoStatus::from_http_status(response.status);
        if status != UserInfoStatus::Success {
            warn!(status_code = response.status, "User info request failed");
            return UserInfoResult::status_only(status);
        }

        match serde_json::from_str::<T>(&response.body) {
            Ok(value) => {
                info!("User info request successful");
                UserInfoResult::new(UserInfoStatus::Success, Some(value))
            }
            Err(err) => {
                warn!(error = %err, "User info payload did not match the expected shape");
                UserInfoResult::status_only(UserInfoStatus::OtherError)
            }
        }
    }

    async fn refresh_or_logout(self: &Arc<Self>, refresh_token: Option<String>) -> TokenResult {
        if refresh_token.as_deref().is_some_and(|token| !token.trim().is_empty()) {
            return self.try_refresh_token().await;
        }

        warn!("Refresh token is missing, logging out");
        let _guard = self.transition.lock().await;
        self.set_logged_out().await;
        TokenResult::Expired
    }

    /// Refresh under the transition lock, re-reading the refresh token so a
    /// token rotated by a concurrent refresh is the one presented.
    async fn try_refresh_token(self: &Arc<Self>) -> TokenResult {
        let _guard = self.transition.lock().await;

        let Some(refresh_token) = self.store.refresh_token().filter(|token| !token.is_empty())
        else {
            warn!("Refresh token is missing, logging out");
            self.set_logged_out().await;
            return TokenResult::Expired;
        };

        if self.refresh_with(&refresh_token).await == RefreshOutcome::Success {
            self.schedule_next_refresh();
            return TokenResult::Valid;
        }

        warn!("Token refresh failed, logging out");
        self.set_logged_out().await;
        TokenResult::Expired
    }

    async fn refresh_with(&self, refresh_token: &str) -> RefreshOutcome {
        if !self.ensure_network() {
            return RefreshOutcome::NoInternet;
        }

        let extras = self.config.oidc.back_channel_parameters();
        let tokens = match self.provider.refresh_token(refresh_token, &extras).await {
            Ok(tokens) => tokens,
            Err(err) => {
                error!(error = %err, "Token refresh error");
                return RefreshOutcome::Failed;
            }
        };

        if let Err(err) = self.store.save_tokens(&tokens).await {
            error!(error = %err, "Failed to persist refreshed tokens");
            return RefreshOutcome::Failed;
        }

        info!("Token refresh successful");
        RefreshOutcome::Success
    }

    /// Caller must hold the transition lock.
    async fn set_logged_out(&self) {
        self.timer.disarm();
        if let Err(err) = self.store.clear().await {
            error!(error = %err, "Failed to remove tokens from secure storage");
        }
        info!("User logged out and tokens cleared");
    }

    fn schedule_next_refresh(self: &Arc<Self>) {
        let Some(expiration) = self.store.snapshot().usable_expiration() else {
            self.timer.disarm();
            info!("No access token expiration, skipping refresh scheduling");
            return;
        };

        let delay = refresh_delay(expiration, Utc::now());
        let session = Arc::downgrade(self);
        self.timer.arm(delay, move || async move {
            if let Some(session) = session.upgrade() {
                session.check_and_refresh().await;
            }
        });
        info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Scheduled next token refresh"
        );
    }

    async fn check_and_refresh(self: &Arc<Self>) {
        info!("Refresh timer fired");
        let Some(expiration) = self.store.snapshot().usable_expiration() else {
            warn!("Access token expiration not found");
            return;
        };

        if is_past_half_life(expiration, Utc::now()) {
            let result = self.try_refresh_token().await;
            info!(result = %result, "Scheduled refresh finished");
        } else {
            info!("Token not past its half-life, refresh skipped");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::session.
    use std::collections::BTreeMap;
    use std::time::Duration;

    use chrono::{DateTime, Duration as ChronoDuration};
    use oidc_session_domain::constants::{ACCESS_TOKEN_KEY, TOKEN_STORAGE_KEYS};
    use oidc_session_domain::OidcConfig;
    use serde::Deserialize;

    use super::*;
    use crate::auth::{ProbeError, ProviderError};
    use crate::testing::{
        login_for, tokens_expiring_in, MockIdentityProvider, MockSecureStorage,
        MockUserInfoProbe, StaticReachability,
    };

    type TestSession = SessionManager<MockIdentityProvider, MockUserInfoProbe, MockSecureStorage>;

    struct Harness {
        session: TestSession,
        storage: Arc<MockSecureStorage>,
        provider: Arc<MockIdentityProvider>,
        probe: Arc<MockUserInfoProbe>,
        network: Arc<StaticReachability>,
    }

    fn config() -> AuthConfig {
        AuthConfig {
            api_url: Some("https://api.example.com".to_string()),
            app_callback_url: "callback".to_string(),
            oidc: OidcConfig {
                authority: "https://tenant.eu.auth0.com".to_string(),
                client_id: "client123".to_string(),
                scopes: vec!["openid".to_string(), "offline_access".to_string()],
                user_info_url: "https://tenant.eu.auth0.com/userinfo".to_string(),
                token_endpoint: None,
                front_channel_extra_parameters: None,
                back_channel_extra_parameters: Some(BTreeMap::from([(
                    "audience".to_string(),
                    "api.example.com".to_string(),
                )])),
            },
        }
    }

    fn harness() -> Harness {
        let storage = Arc::new(MockSecureStorage::new());
        let provider = Arc::new(MockIdentityProvider::new());
        let probe = Arc::new(MockUserInfoProbe::new());
        let network = Arc::new(StaticReachability::new(true));
        let store = Arc::new(TokenStore::new(Arc::clone(&storage)));
        let session = SessionManager::new(
            Arc::new(config()),
            store,
            Arc::clone(&provider),
            Arc::clone(&probe),
            Arc::clone(&network) as Arc<dyn NetworkReachability>,
        );
        Harness { session, storage, provider, probe, network }
    }

    async fn seed(h: &Harness, expiration: Option<DateTime<Utc>>, refresh: &str) {
        h.session.token_store().save("access-1", "identity-1", refresh, expiration).await.unwrap();
    }

    /// Validates the offline validation scenario.
    ///
    /// Assertions:
    /// - Returns `NoInternet`.
    /// - Neither the user-info probe nor the provider is called.
    #[tokio::test]
    async fn test_validate_without_network() {
        let h = harness();
        seed(&h, Some(Utc::now() - ChronoDuration::minutes(1)), "refresh-1").await;
        h.network.set_online(false);

        assert_eq!(h.session.validate_token().await, TokenResult::NoInternet);
        assert_eq!(h.probe.calls(), 0);
        assert_eq!(h.provider.refresh_calls(), 0);
        assert!(h.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_validate_without_access_token() {
        let h = harness();
        assert_eq!(h.session.validate_token().await, TokenResult::OtherError);
        assert_eq!(h.probe.calls(), 0);
    }

    /// Validates the expired token with a working refresh scenario.
    ///
    /// Assertions:
    /// - Returns `Valid` after one refresh with the stored refresh token.
    /// - The rotated bundle is persisted and the timer is re-armed.
    /// - The user-info probe is skipped.
    #[tokio::test]
    async fn test_validate_expired_token_refreshes() {
        let h = harness();
        seed(&h, Some(Utc::now() - ChronoDuration::minutes(1)), "refresh-1").await;
        h.provider.push_refresh_result(Ok(tokens_expiring_in(
            "2",
            Utc::now(),
            ChronoDuration::minutes(10),
        )));

        assert_eq!(h.session.validate_token().await, TokenResult::Valid);
        assert_eq!(h.provider.refresh_tokens_seen(), vec!["refresh-1".to_string()]);
        assert_eq!(h.storage.value(ACCESS_TOKEN_KEY).as_deref(), Some("access-2"));
        assert!(h.session.is_refresh_scheduled());
        assert_eq!(h.probe.calls(), 0);
    }

    /// Validates the expired token with a rejected refresh scenario.
    ///
    /// Assertions:
    /// - Returns `Expired`.
    /// - All four storage keys are gone and the timer is disarmed.
    #[tokio::test]
    async fn test_validate_expired_token_refresh_failure_logs_out() {
        let h = harness();
        seed(&h, Some(Utc::now() - ChronoDuration::minutes(1)), "refresh-1").await;
        h.provider.push_refresh_result(Err(ProviderError::Rejected("invalid_grant".into())));

        assert_eq!(h.session.validate_token().await, TokenResult::Expired);
        assert!(!h.session.is_authenticated());
        assert!(h.storage.keys().is_empty());
        assert!(!h.session.is_refresh_scheduled());
        assert_eq!(h.session.state(), SessionState::LoggedOut);
    }

    #[tokio::test]
    async fn test_validate_expired_without_refresh_token() {
        let h = harness();
        seed(&h, Some(Utc::now() - ChronoDuration::minutes(1)), "").await;

        assert_eq!(h.session.validate_token().await, TokenResult::Expired);
        assert_eq!(h.provider.refresh_calls(), 0);
        assert!(h.storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_validate_without_expiration_takes_refresh_path() {
        let h = harness();
        seed(&h, None, "refresh-1").await;
        assert_eq!(h.session.state(), SessionState::Unknown);

        assert_eq!(h.session.validate_token().await, TokenResult::Expired);
        assert_eq!(h.provider.refresh_calls(), 1);
    }

    /// Validates the provider-side revocation scenario.
    ///
    /// Assertions:
    /// - A 401 from user-info on an unexpired token triggers a refresh.
    /// - The refreshed session is reported `Valid`.
    #[tokio::test]
    async fn test_validate_unauthorized_probe_refreshes() {
        let h = harness();
        seed(&h, Some(Utc::now() + ChronoDuration::minutes(10)), "refresh-1").await;
        h.probe.respond_with(401, "");
        h.provider.push_refresh_result(Ok(tokens_expiring_in(
            "2",
            Utc::now(),
            ChronoDuration::minutes(10),
        )));

        assert_eq!(h.session.validate_token().await, TokenResult::Valid);
        assert_eq!(h.probe.calls(), 1);
        assert_eq!(h.provider.refresh_calls(), 1);
        assert_eq!(h.session.token_store().access_token().as_deref(), Some("access-2"));
    }

    #[tokio::test]
    async fn test_validate_unauthorized_probe_without_refresh_logs_out() {
        let h = harness();
        seed(&h, Some(Utc::now() + ChronoDuration::minutes(10)), "").await;
        h.probe.respond_with(401, "");

        assert_eq!(h.session.validate_token().await, TokenResult::Expired);
        assert!(!h.session.is_authenticated());
    }

    /// Validates the healthy token scenario.
    ///
    /// Assertions:
    /// - The probe is called with the stored bearer token.
    /// - The timer is armed roughly nine minutes out.
    #[tokio::test]
    async fn test_validate_valid_token_reschedules() {
        let h = harness();
        seed(&h, Some(Utc::now() + ChronoDuration::minutes(10)), "refresh-1").await;

        assert_eq!(h.session.validate_token().await, TokenResult::Valid);
        assert_eq!(h.probe.tokens_seen(), vec![Some("access-1".to_string())]);
        assert_eq!(h.provider.refresh_calls(), 0);

        let delay = h.session.scheduled_refresh_delay().unwrap();
        assert!(delay <= Duration::from_millis(540_000));
        assert!(delay > Duration::from_millis(530_000));
    }

    #[tokio::test]
    async fn test_validate_server_error_still_valid() {
        let h = harness();
        seed(&h, Some(Utc::now() + ChronoDuration::minutes(10)), "refresh-1").await;
        h.probe.respond_with(500, "");

        assert_eq!(h.session.validate_token().await, TokenResult::Valid);
        assert_eq!(h.provider.refresh_calls(), 0);
    }

    /// Validates the successful login scenario.
    ///
    /// Assertions:
    /// - All four fields are persisted.
    /// - The timer is armed.
    /// - The result carries the expiration and the identity claims.
    #[tokio::test]
    async fn test_login_success_persists_and_schedules() {
        let h = harness();
        let tokens = tokens_expiring_in("1", Utc::now(), ChronoDuration::hours(1));
        let expiration = tokens.expiration;
        h.provider.set_login_result(Ok(login_for("alice", tokens)));

        let result = h.session.try_login().await;

        assert_eq!(result.result, TokenResult::Valid);
        assert_eq!(result.token_expiration, expiration);
        assert_eq!(
            result.user.as_ref().and_then(|user| user.get("name")).and_then(|v| v.as_str()),
            Some("alice")
        );
        let mut expected: Vec<String> = TOKEN_STORAGE_KEYS.iter().map(ToString::to_string).collect();
        expected.sort();
        assert_eq!(h.storage.keys(), expected);
        assert!(h.session.is_refresh_scheduled());
        assert_eq!(h.session.state(), SessionState::Valid);
    }

    #[tokio::test]
    async fn test_login_error_is_verbatim() {
        let h = harness();
        h.provider.set_login_result(Err(ProviderError::Browser("UserCancel".into())));

        let result = h.session.try_login().await;

        assert_eq!(result.result, TokenResult::OtherError);
        assert_eq!(result.error_message.as_deref(), Some("UserCancel"));
        assert!(h.storage.keys().is_empty());
        assert!(!h.session.is_refresh_scheduled());
    }

    #[tokio::test]
    async fn test_login_without_network() {
        let h = harness();
        h.network.set_online(false);

        let result = h.session.try_login().await;

        assert_eq!(result.result, TokenResult::NoInternet);
        assert_eq!(h.provider.login_calls(), 0);
    }

    #[tokio::test]
    async fn test_login_storage_failure_reports_error() {
        let h = harness();
        h.provider.set_login_result(Ok(login_for(
            "bob",
            tokens_expiring_in("1", Utc::now(), ChronoDuration::hours(1)),
        )));
        h.storage.set_failing(true);

        let result = h.session.try_login().await;

        assert_eq!(result.result, TokenResult::OtherError);
        assert!(!h.session.is_authenticated());
        assert!(!h.session.is_refresh_scheduled());
    }

    /// Validates the successful logout scenario.
    ///
    /// Assertions:
    /// - Storage keys are removed and the timer is disarmed.
    #[tokio::test]
    async fn test_logout_success_clears_session() {
        let h = harness();
        h.provider.set_login_result(Ok(login_for(
            "alice",
            tokens_expiring_in("1", Utc::now(), ChronoDuration::hours(1)),
        )));
        h.session.try_login().await;
        assert!(h.session.is_refresh_scheduled());

        let result = h.session.try_logout().await;

        assert_eq!(result.status, LogoutStatus::Success);
        assert!(h.storage.keys().is_empty());
        assert!(!h.session.is_refresh_scheduled());
        assert!(!h.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_failure_keeps_tokens() {
        let h = harness();
        seed(&h, Some(Utc::now() + ChronoDuration::hours(1)), "refresh-1").await;
        h.provider.set_logout_result(Err(ProviderError::Browser("end session failed".into())));

        let result = h.session.try_logout().await;

        assert_eq!(result.status, LogoutStatus::UnknownError);
        assert_eq!(result.error_message.as_deref(), Some("end session failed"));
        assert_eq!(h.storage.keys().len(), 4);
        assert!(h.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_without_network() {
        let h = harness();
        h.network.set_online(false);

        let result = h.session.try_logout().await;

        assert_eq!(result.status, LogoutStatus::NoInternet);
        assert_eq!(h.provider.logout_calls(), 0);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Profile {
        sub: String,
        email: String,
    }

    /// Validates user-info status classification and typed payloads.
    ///
    /// Assertions:
    /// - 2xx deserialises into the requested shape.
    /// - 401, 500 and other statuses map to their classification.
    /// - An undeserialisable body and a transport failure are `OtherError`.
    #[tokio::test]
    async fn test_get_user_info_classification() {
        let h = harness();
        seed(&h, Some(Utc::now() + ChronoDuration::hours(1)), "refresh-1").await;

        h.probe.push_response(200, r#"{"sub":"auth0|1","email":"a@example.com","extra":1}"#);
        let ok: UserInfoResult<Profile> = h.session.get_user_info().await;
        assert_eq!(ok.status, UserInfoStatus::Success);
        assert_eq!(
            ok.value,
            Some(Profile { sub: "auth0|1".to_string(), email: "a@example.com".to_string() })
        );

        h.probe.push_response(401, "");
        h.probe.push_response(500, "");
        h.probe.push_response(403, "");
        h.probe.push_response(200, "not json");
        for expected in [
            UserInfoStatus::Unauthorized,
            UserInfoStatus::ServerError,
            UserInfoStatus::OtherError,
            UserInfoStatus::OtherError,
        ] {
            let result: UserInfoResult<Profile> = h.session.get_user_info().await;
            assert_eq!(result.status, expected);
            assert!(result.value.is_none());
        }

        h.probe.fail_with("connection reset");
        let failed: UserInfoResult<Profile> = h.session.get_user_info().await;
        assert_eq!(failed.status, UserInfoStatus::OtherError);
    }

    #[tokio::test]
    async fn test_get_user_info_without_network() {
        let h = harness();
        h.network.set_online(false);

        let result: UserInfoResult<serde_json::Value> = h.session.get_user_info().await;

        assert_eq!(result.status, UserInfoStatus::NoInternet);
        assert_eq!(h.probe.calls(), 0);
    }

    #[tokio::test]
    async fn test_initialize_loads_and_schedules() {
        let h = harness();
        let expiration = Utc::now() + ChronoDuration::minutes(10);
        h.storage.insert(ACCESS_TOKEN_KEY, "persisted");
        h.storage.insert(
            oidc_session_domain::constants::ACCESS_TOKEN_EXPIRATION_KEY,
            &expiration.to_rfc3339(),
        );

        assert!(h.session.initialize().await.unwrap());
        assert!(h.session.is_authenticated());
        assert!(h.session.is_refresh_scheduled());
    }

    #[tokio::test]
    async fn test_initialize_empty_storage() {
        let h = harness();
        assert!(!h.session.initialize().await.unwrap());
        assert!(!h.session.is_refresh_scheduled());
        assert_eq!(h.session.state(), SessionState::LoggedOut);
    }

    #[tokio::test]
    async fn test_initialize_storage_failure() {
        let h = harness();
        h.storage.set_failing(true);
        assert!(h.session.initialize().await.is_err());
    }

    /// Validates the timer-driven refresh scenario.
    ///
    /// Assertions:
    /// - A token already past expiry is refreshed once the one second floor
    ///   elapses.
    /// - The refreshed session is re-armed.
    #[tokio::test(start_paused = true)]
    async fn test_timer_refreshes_expired_token() {
        let h = harness();
        h.provider.set_login_result(Ok(login_for(
            "alice",
            tokens_expiring_in("1", Utc::now(), ChronoDuration::seconds(-5)),
        )));
        h.provider.push_refresh_result(Ok(tokens_expiring_in(
            "2",
            Utc::now(),
            ChronoDuration::hours(1),
        )));

        h.session.try_login().await;
        assert_eq!(h.session.scheduled_refresh_delay(), Some(Duration::from_millis(1_000)));

        tokio::time::sleep(Duration::from_millis(1_500)).await;

        assert_eq!(h.provider.refresh_calls(), 1);
        assert_eq!(h.session.token_store().access_token().as_deref(), Some("access-2"));
        assert!(h.session.is_refresh_scheduled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_skips_refresh_before_half_life() {
        let h = harness();
        h.provider.set_login_result(Ok(login_for(
            "alice",
            tokens_expiring_in("1", Utc::now(), ChronoDuration::hours(1)),
        )));
        h.session.try_login().await;

        let delay = h.session.scheduled_refresh_delay().unwrap();
        tokio::time::sleep(delay + Duration::from_secs(1)).await;

        assert_eq!(h.provider.refresh_calls(), 0);
        assert!(!h.session.is_refresh_scheduled());
        assert!(h.session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_refresh_offline_logs_out() {
        let h = harness();
        h.provider.set_login_result(Ok(login_for(
            "alice",
            tokens_expiring_in("1", Utc::now(), ChronoDuration::seconds(-5)),
        )));
        h.session.try_login().await;
        h.network.set_online(false);

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(h.provider.refresh_calls(), 0);
        assert!(!h.session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_session_cancels_timer() {
        let h = harness();
        h.provider.set_login_result(Ok(login_for(
            "alice",
            tokens_expiring_in("1", Utc::now(), ChronoDuration::seconds(-5)),
        )));
        h.session.try_login().await;

        let Harness { session, provider, .. } = h;
        drop(session);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(provider.refresh_calls(), 0);
    }

    /// Validates concurrent refreshes through the transition lock.
    ///
    /// Assertions:
    /// - The second refresh presents the token rotated by the first.
    /// - The final bundle is the one committed last.
    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refreshes_are_serialised() {
        let h = harness();
        seed(&h, Some(Utc::now() - ChronoDuration::minutes(1)), "refresh-1").await;
        h.provider.set_refresh_latency(Duration::from_millis(200));
        h.provider.push_refresh_result(Ok(tokens_expiring_in(
            "2",
            Utc::now(),
            ChronoDuration::hours(1),
        )));
        h.provider.push_refresh_result(Ok(tokens_expiring_in(
            "3",
            Utc::now(),
            ChronoDuration::hours(1),
        )));

        let (first, second) = tokio::join!(h.session.validate_token(), h.session.validate_token());

        assert_eq!(first, TokenResult::Valid);
        assert_eq!(second, TokenResult::Valid);
        assert_eq!(
            h.provider.refresh_tokens_seen(),
            vec!["refresh-1".to_string(), "refresh-2".to_string()]
        );
        assert_eq!(h.session.token_store().access_token().as_deref(), Some("access-3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_during_refresh_wins() {
        let h = harness();
        seed(&h, Some(Utc::now() - ChronoDuration::minutes(1)), "refresh-1").await;
        h.provider.set_refresh_latency(Duration::from_millis(200));
        h.provider.push_refresh_result(Ok(tokens_expiring_in(
            "2",
            Utc::now(),
            ChronoDuration::hours(1),
        )));

        let (refreshed, logout) = tokio::join!(h.session.validate_token(), h.session.try_logout());

        assert_eq!(refreshed, TokenResult::Valid);
        assert_eq!(logout.status, LogoutStatus::Success);
        assert!(!h.session.is_authenticated());
        assert!(h.storage.keys().is_empty());
        assert!(!h.session.is_refresh_scheduled());
    }

    #[tokio::test]
    async fn test_probe_error_type_displays() {
        assert_eq!(
            ProbeError("timeout".into()).to_string(),
            "User info request failed: timeout"
        );
    }
}
