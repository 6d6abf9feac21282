//! # OIDC Session Domain
//!
//! Domain types shared by every crate in the workspace.
//!
//! This crate contains:
//! - Configuration records for the identity provider and the backend API
//! - Outcome records returned by the session manager (`TokenResult`,
//!   `LoginResult`, `LogoutResult`, `UserInfoResult`)
//! - The workspace error type and `Result` alias
//! - Storage key names and refresh timing constants
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - Only external dependencies allowed
//! - Pure data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
