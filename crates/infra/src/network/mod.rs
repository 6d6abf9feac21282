//! Network reachability

pub mod reachability;

pub use reachability::{ConnectivityConfig, ConnectivityMonitor};
