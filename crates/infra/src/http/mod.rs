//! HTTP plumbing for the resource server and the user-info endpoint

pub mod authenticated;
pub mod client;
pub mod user_info;

pub use authenticated::AuthenticatedClient;
pub use client::HttpClient;
pub use user_info::HttpUserInfoProbe;
