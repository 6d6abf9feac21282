//! Testing utilities
//!
//! - **[`mocks`]**: in-memory storage, reachability, identity provider and
//!   user-info doubles
//! - **[`fixtures`]**: token bundles and login results
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "test-utils")]
//! # {
//! use std::sync::Arc;
//!
//! use oidc_session_common::testing::{MockSecureStorage, StaticReachability};
//! use oidc_session_common::NetworkReachability;
//!
//! let storage = Arc::new(MockSecureStorage::new());
//! storage.insert("authentication.access_token", "A1");
//! assert_eq!(storage.keys(), vec!["authentication.access_token".to_string()]);
//!
//! let network = StaticReachability::new(false);
//! assert!(!network.has_internet());
//! # }
//! ```

pub mod fixtures;
pub mod mocks;

pub use fixtures::{login_for, tokens_expiring_in, user_claims};
pub use mocks::{MockIdentityProvider, MockSecureStorage, MockUserInfoProbe, StaticReachability};
