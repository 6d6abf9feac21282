//! Configuration loading
//!
//! Reads the layered `appsettings` files and environment overrides into an
//! immutable [`oidc_session_domain::AuthConfig`].

pub mod loader;

// Re-export commonly used items
pub use loader::{env_overrides, env_overrides_from, load, ConfigLoader, EnvOverride};
