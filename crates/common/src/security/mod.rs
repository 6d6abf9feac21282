//! Platform secret storage

pub mod keychain;

pub use keychain::{KeychainError, KeychainProvider};
