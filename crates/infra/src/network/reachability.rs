//! Background connectivity monitor
//!
//! The session manager asks "is there internet?" synchronously before every
//! outbound call. The monitor answers from a cached flag that a background
//! task refreshes by opening a TCP connection to the provider on an interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use oidc_session_common::auth::NetworkReachability;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use url::Url;

use crate::errors::InfraError;

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Probe target and timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityConfig {
    /// `host:port` to connect to
    pub target: String,
    pub interval: Duration,
    /// Connect timeout per check
    pub probe_timeout: Duration,
}

impl ConnectivityConfig {
    /// Check `target` (`host:port`) with the default interval and timeout
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            interval: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(3),
        }
    }

    /// Probe the authority's host on its scheme's default port (443 for https)
    ///
    /// # Errors
    /// Returns `InfraError::Url` for an unparseable authority and
    /// `InfraError::Config` when it has no host or port.
    pub fn for_authority(authority: &str) -> Result<Self, InfraError> {
        let url = Url::parse(authority)?;
        let host = url
            .host_str()
            .ok_or_else(|| InfraError::Config(format!("Authority has no host: {authority}")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| InfraError::Config(format!("Authority has no port: {authority}")))?;
        Ok(Self::new(format!("{host}:{port}")))
    }

    /// Time between background checks
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Connect timeout for a single check
    #[must_use]
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

/// `NetworkReachability` backed by a periodic TCP probe
///
/// Reports offline until the first probe completes.
pub struct ConnectivityMonitor {
    config: ConnectivityConfig,
    online: Arc<AtomicBool>,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl ConnectivityMonitor {
    /// Stopped monitor; reports offline until the first check
    pub fn new(config: ConnectivityConfig) -> Self {
        Self {
            config,
            online: Arc::new(AtomicBool::new(false)),
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Probe once, then keep probing in the background
    ///
    /// # Errors
    /// Returns `InfraError::Internal` if the monitor is already running.
    #[instrument(skip(self), fields(target = %self.config.target))]
    pub async fn start(&mut self) -> Result<(), InfraError> {
        if self.is_running() {
            return Err(InfraError::Internal("connectivity monitor already running".into()));
        }

        self.check_now().await;

        self.cancellation_token = CancellationToken::new();
        let config = self.config.clone();
        let online = Arc::clone(&self.online);
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::probe_loop(config, online, cancel).await;
        });
        *self.task_handle.lock().await = Some(handle);

        info!("Connectivity monitor started");
        Ok(())
    }

    /// Cancel the background task and wait for it to finish
    pub async fn stop(&mut self) {
        self.cancellation_token.cancel();
        if let Some(handle) = self.task_handle.lock().await.take() {
            if let Err(e) = handle.await {
                debug!(error = %e, "Connectivity task ended abnormally");
            }
        }
        info!("Connectivity monitor stopped");
    }

    /// True while the background task is alive
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Probe immediately and update the cached flag
    pub async fn check_now(&self) -> bool {
        let online = probe(&self.config.target, self.config.probe_timeout).await;
        record(&self.online, online);
        online
    }

    async fn probe_loop(config: ConnectivityConfig, online: Arc<AtomicBool>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Connectivity loop cancelled");
                    break;
                }
                () = tokio::time::sleep(config.interval) => {
                    let reachable = probe(&config.target, config.probe_timeout).await;
                    record(&online, reachable);
                }
            }
        }
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

impl NetworkReachability for ConnectivityMonitor {
    fn has_internet(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

async fn probe(target: &str, timeout: Duration) -> bool {
    matches!(tokio::time::timeout(timeout, TcpStream::connect(target)).await, Ok(Ok(_)))
}

fn record(flag: &AtomicBool, online: bool) {
    let previous = flag.swap(online, Ordering::SeqCst);
    if previous != online {
        info!(online, "Connectivity changed");
    }
}
