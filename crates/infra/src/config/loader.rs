//! Layered settings loader
//!
//! ## Loading Strategy
//! Settings files are read from a base directory and merged key by key, each
//! layer overriding the previous one:
//! 1. `appsettings`
//! 2. `appsettings.<platform>`
//! 3. `appsettings.Development` (development builds only)
//! 4. `appsettings.<platform>.Development` (development builds only)
//!
//! Each layer may be `.json` or `.toml` (JSON wins when both exist). Missing
//! layers are skipped, but at least one must be present. Environment
//! overrides are applied last, then the result is validated.
//!
//! ## Environment Variables
//! - `OIDC_SESSION_AUTHORITY`: `Auth.Oidc.Authority`
//! - `OIDC_SESSION_CLIENT_ID`: `Auth.Oidc.ClientId`
//! - `OIDC_SESSION_SCOPES`: `Auth.Oidc.Scopes` (space or comma separated)
//! - `OIDC_SESSION_USER_INFO_URL`: `Auth.Oidc.UserInfoUrl`
//! - `OIDC_SESSION_TOKEN_ENDPOINT`: `Auth.Oidc.TokenEndpoint`
//! - `OIDC_SESSION_APP_CALLBACK_URL`: `Auth.AppCallbackUrl`
//! - `OIDC_SESSION_API_URL`: `Auth.ApiUrl`

use std::path::{Path, PathBuf};

use oidc_session_domain::{AuthConfig, SessionError, Settings};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::InfraError;

const BASE_NAME: &str = "appsettings";
const DEVELOPMENT: &str = "Development";

/// Environment variable and the settings path it overrides
const ENV_OVERRIDES: [(&str, &[&str]); 7] = [
    ("OIDC_SESSION_AUTHORITY", &["Auth", "Oidc", "Authority"]),
    ("OIDC_SESSION_CLIENT_ID", &["Auth", "Oidc", "ClientId"]),
    ("OIDC_SESSION_SCOPES", &["Auth", "Oidc", "Scopes"]),
    ("OIDC_SESSION_USER_INFO_URL", &["Auth", "Oidc", "UserInfoUrl"]),
    ("OIDC_SESSION_TOKEN_ENDPOINT", &["Auth", "Oidc", "TokenEndpoint"]),
    ("OIDC_SESSION_APP_CALLBACK_URL", &["Auth", "AppCallbackUrl"]),
    ("OIDC_SESSION_API_URL", &["Auth", "ApiUrl"]),
];

/// An environment override: variable name and its non-empty value
pub type EnvOverride = (&'static str, String);

/// Loads [`AuthConfig`] from layered settings files
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base_dir: PathBuf,
    platform: String,
    development: bool,
}

impl ConfigLoader {
    /// Loader for the current OS, with development layers in debug builds
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            platform: std::env::consts::OS.to_string(),
            development: cfg!(debug_assertions),
        }
    }

    /// Override the platform layer name (`macos`, `windows`, ...)
    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Include or skip the `Development` layers
    #[must_use]
    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Layer file stems in merge order
    #[must_use]
    pub fn layer_names(&self) -> Vec<String> {
        let mut names =
            vec![BASE_NAME.to_string(), format!("{BASE_NAME}.{}", self.platform)];
        if self.development {
            names.push(format!("{BASE_NAME}.{DEVELOPMENT}"));
            names.push(format!("{BASE_NAME}.{}.{DEVELOPMENT}", self.platform));
        }
        names
    }

    /// Existing layer files in merge order
    #[must_use]
    pub fn existing_layers(&self) -> Vec<PathBuf> {
        self.layer_names()
            .into_iter()
            .filter_map(|name| {
                ["json", "toml"]
                    .iter()
                    .map(|ext| self.base_dir.join(format!("{name}.{ext}")))
                    .find(|path| path.is_file())
            })
            .collect()
    }

    /// Load, apply process environment overrides and validate
    ///
    /// # Errors
    /// Returns `InfraError::Config` when no layer exists, a layer cannot be
    /// parsed, or the merged settings are incomplete.
    pub fn load(&self) -> Result<AuthConfig, InfraError> {
        self.load_with_overrides(&env_overrides())
    }

    /// Load with explicit overrides instead of the process environment
    ///
    /// # Errors
    /// See [`ConfigLoader::load`].
    pub fn load_with_overrides(&self, overrides: &[EnvOverride]) -> Result<AuthConfig, InfraError> {
        let mut merged = self.merged_layers()?;
        apply_overrides(&mut merged, overrides);

        let settings: Settings = serde_json::from_value(merged)
            .map_err(|e| InfraError::Config(format!("Invalid settings: {e}")))?;
        settings.auth.validate().map_err(|e| match e {
            SessionError::Config(message) => InfraError::Config(message),
            other => InfraError::Config(other.to_string()),
        })?;

        Ok(settings.auth)
    }

    fn merged_layers(&self) -> Result<Value, InfraError> {
        let layers = self.existing_layers();
        if layers.is_empty() {
            return Err(InfraError::Config(format!(
                "No {BASE_NAME} file found in {}",
                self.base_dir.display()
            )));
        }

        let mut merged = Value::Object(Map::new());
        for path in layers {
            info!(path = %path.display(), "Loading settings layer");
            let contents = std::fs::read_to_string(&path).map_err(|e| {
                InfraError::Config(format!("Failed to read {}: {e}", path.display()))
            })?;
            merge(&mut merged, parse_layer(&contents, &path)?);
        }
        Ok(merged)
    }
}

/// Load settings from `base_dir` with default platform and build profile
///
/// # Errors
/// See [`ConfigLoader::load`].
pub fn load(base_dir: impl Into<PathBuf>) -> Result<AuthConfig, InfraError> {
    ConfigLoader::new(base_dir).load()
}

/// Read `OIDC_SESSION_*` overrides from the process environment
#[must_use]
pub fn env_overrides() -> Vec<EnvOverride> {
    env_overrides_from(|key| std::env::var(key).ok())
}

/// Collect overrides through `lookup`, skipping unset or blank values
pub fn env_overrides_from(lookup: impl Fn(&str) -> Option<String>) -> Vec<EnvOverride> {
    ENV_OVERRIDES
        .iter()
        .filter_map(|(key, _)| {
            lookup(*key).filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
        })
        .collect()
}

/// Parse a layer as JSON or TOML by file extension
fn parse_layer(contents: &str, path: &Path) -> Result<Value, InfraError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| {
            InfraError::Config(format!("Invalid TOML in {}: {e}", path.display()))
        }),
        "json" => serde_json::from_str(contents).map_err(|e| {
            InfraError::Config(format!("Invalid JSON in {}: {e}", path.display()))
        }),
        _ => Err(InfraError::Config(format!("Unsupported settings format: {extension}"))),
    }
}

/// Deep-merge `overlay` into `base`; objects merge per key, anything else
/// replaces.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn apply_overrides(settings: &mut Value, overrides: &[EnvOverride]) {
    for (key, raw) in overrides {
        let Some((_, path)) = ENV_OVERRIDES.iter().find(|(name, _)| name == key) else {
            continue;
        };
        debug!(variable = %key, "Applying environment override");

        let leaf = if *key == "OIDC_SESSION_SCOPES" {
            Value::Array(
                raw.split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|scope| !scope.is_empty())
                    .map(|scope| Value::String(scope.to_string()))
                    .collect(),
            )
        } else {
            Value::String(raw.clone())
        };

        let overlay = path.iter().rev().fold(leaf, |inner, segment| {
            let mut map = Map::new();
            map.insert((*segment).to_string(), inner);
            Value::Object(map)
        });
        merge(settings, overlay);
    }
}
