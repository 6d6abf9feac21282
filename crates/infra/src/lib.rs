//! # OIDC Session Infrastructure
//!
//! Concrete collaborators for the session manager in
//! `oidc-session-common`.
//!
//! This crate contains:
//! - Layered `appsettings` loading with environment overrides
//! - A retrying HTTP client, a bearer-attaching client and the user-info probe
//! - The backend API forecast repository
//! - A background connectivity monitor
//! - Tracing subscriber bootstrap
//!
//! ## Architecture
//! - Implements traits defined in `oidc_session_common::auth`
//! - Depends on `oidc-session-domain` and `oidc-session-common`
//! - Contains all network and file I/O outside the keychain

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod network;
pub mod observability;

// Re-export commonly used items
pub use api::{ForecastRepository, WeatherForecast};
pub use config::ConfigLoader;
pub use errors::InfraError;
pub use http::{AuthenticatedClient, HttpClient, HttpUserInfoProbe};
pub use network::{ConnectivityConfig, ConnectivityMonitor};
pub use observability::{init_tracing, LogFormat};
