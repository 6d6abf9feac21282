//! Macro for implementing Display and FromStr for status enums
//!
//! Status enums returned by the session manager are logged and printed by
//! hosts; this macro gives them one consistent string form.
//!
//! # Example
//!
//! ```rust
//! use oidc_session_domain::impl_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Probe {
//!     Up,
//!     Down,
//! }
//!
//! impl_status_conversions!(Probe {
//!     Up => "up",
//!     Down => "down",
//! });
//!
//! assert_eq!(Probe::Up.to_string(), "up");
//! assert_eq!("DOWN".parse::<Probe>(), Ok(Probe::Down));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// - Display writes the mapped string
/// - FromStr parses case-insensitively and names the enum in its error
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
