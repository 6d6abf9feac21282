//! Session and token lifecycle management for OIDC clients.
//!
//! # Feature Tiers
//!
//! - default: token store, session manager, refresh scheduler and the
//!   collaborator traits they depend on
//! - `platform`: OS keychain storage (`keyring`) and the HTTP refresh-token
//!   client (`reqwest`)
//! - `test-utils`: in-memory collaborators for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;

#[cfg(feature = "platform")]
pub mod security;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types for convenience
// ------------------------
pub use auth::{
    IdentityProviderClient, NetworkReachability, RefreshTimer, SecureStorage, SessionManager,
    TokenBundle, TokenStore, UserInfoProbe,
};
#[cfg(feature = "platform")]
pub use security::{KeychainError, KeychainProvider};
