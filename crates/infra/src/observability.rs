//! Tracing bootstrap for binaries
//!
//! Library crates only emit `tracing` events; the host installs exactly one
//! subscriber. `RUST_LOG` takes precedence over the level passed in.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON, anything else the human format
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Filter from `RUST_LOG`, falling back to `default_level`
#[must_use]
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(default_level: &str, format: LogFormat) -> bool {
    let filter = env_filter(default_level);

    let result = match format {
        LogFormat::Json => fmt::fmt().with_env_filter(filter).json().try_init(),
        LogFormat::Pretty => fmt::fmt().with_env_filter(filter).with_target(false).try_init(),
    };
    result.is_ok()
}
