//! Authenticated session and token lifecycle
//!
//! Holds the access/identity/refresh token bundle, mirrors it to secure
//! storage, validates it against the provider's user-info endpoint and
//! proactively refreshes it on a one-shot timer before it expires. Any
//! refresh failure resolves locally to a logged-out session.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  SessionManager  │  validate / refresh / logout state machine
//! └────────┬─────────┘
//!          │
//!          ├──► TokenStore              (in-memory bundle + SecureStorage)
//!          ├──► RefreshTimer            (single owned one-shot timer)
//!          ├──► IdentityProviderClient  (login, logout, refresh exchange)
//!          ├──► UserInfoProbe           (bearer GET liveness check)
//!          └──► NetworkReachability     (cheap synchronous precondition)
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: token bundle, provider responses, probe response
//! - **[`error`]**: storage, provider and probe errors
//! - **[`traits`]**: collaborator capabilities injected into the manager
//! - **[`token_store`]**: the single source of truth for token material
//! - **[`scheduler`]**: refresh-delay computation and the one-shot timer
//! - **[`session`]**: the orchestrating `SessionManager`
//! - **`client`** (`platform`): `OidcClient`, the HTTP refresh-token grant
//!   plus browser-delegated login/logout

#[cfg(feature = "platform")]
pub mod client;
pub mod error;
#[cfg(feature = "platform")]
mod keychain;
pub mod scheduler;
pub mod session;
pub mod token_store;
pub mod traits;
pub mod types;

// Re-export commonly used types and functions
#[cfg(feature = "platform")]
pub use client::OidcClient;
pub use error::{ProbeError, ProviderError, StorageError};
pub use scheduler::{is_past_half_life, refresh_delay, RefreshTimer};
pub use session::SessionManager;
pub use token_store::TokenStore;
pub use traits::{
    IdentityProviderClient, InteractiveBrowser, NetworkReachability, SecureStorage, UserInfoProbe,
};
pub use types::{
    AuthorizeRequest, EndSessionRequest, LoginRequest, OAuthErrorBody, ProbeResponse,
    ProviderLogin, ProviderTokens, TokenBundle, TokenResponse,
};
