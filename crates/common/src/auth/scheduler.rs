//! Proactive refresh scheduling
//!
//! [`refresh_delay`] picks when to refresh a token relative to its expiration
//! and [`RefreshTimer`] owns the single pending one-shot timer. Arming the
//! timer replaces whatever was pending; a replaced or disarmed timer never
//! fires, even if its sleep had already elapsed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use oidc_session_domain::constants::{MIN_REFRESH_DELAY_MS, REFRESH_MARGIN_MS};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Delay until the next proactive refresh
///
/// With `ttl` the remaining lifetime, the delay is the larger of half the
/// lifetime and the lifetime minus one minute. A non-positive result (the
/// token is already expired) falls back to one second.
#[must_use]
pub fn refresh_delay(expiration: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let ttl_ms = (expiration - now).num_milliseconds();
    let interval_ms = (ttl_ms / 2).max(ttl_ms.saturating_sub(REFRESH_MARGIN_MS));

    match u64::try_from(interval_ms) {
        Ok(ms) if ms > 0 => Duration::from_millis(ms),
        _ => Duration::from_millis(MIN_REFRESH_DELAY_MS),
    }
}

/// Half-life check performed when the refresh timer fires
///
/// Compares `now` against `expiration` minus half of the lifetime remaining at
/// `now`. Since the remaining lifetime is itself measured from `now`, this
/// only holds once the token has actually expired.
#[must_use]
pub fn is_past_half_life(expiration: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let remaining = expiration - now;
    now >= expiration - remaining / 2
}

#[derive(Default)]
struct TimerState {
    generation: u64,
    handle: Option<JoinHandle<()>>,
    delay: Option<Duration>,
}

/// The session's single one-shot refresh timer
///
/// Each `arm` bumps a generation counter; a firing task only runs its
/// callback if its generation is still current. The task detaches itself
/// before running the callback, so a callback that re-arms or disarms the
/// timer never aborts its own execution.
#[derive(Clone, Default)]
pub struct RefreshTimer {
    state: Arc<Mutex<TimerState>>,
}

impl RefreshTimer {
    /// Disarmed timer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending timer and schedule `on_fire` after `delay`
    ///
    /// Requires a Tokio runtime; outside one the call is logged and ignored.
    pub fn arm<F, Fut>(&self, delay: Duration, on_fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!(delay = ?delay, "No async runtime; refresh timer not armed");
            return;
        };

        let mut state = self.state.lock();
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;

        if let Some(previous) = state.handle.take() {
            previous.abort();
        }

        let shared = Arc::clone(&self.state);
        state.delay = Some(delay);
        state.handle = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = shared.lock();
                if state.generation != generation {
                    return;
                }
                state.handle = None;
                state.delay = None;
            }
            on_fire().await;
        }));

        debug!(delay = ?delay, generation, "Refresh timer armed");
    }

    /// Cancel the pending timer, if any
    pub fn disarm(&self) {
        let mut state = self.state.lock();
        state.generation = state.generation.wrapping_add(1);
        state.delay = None;
        if let Some(handle) = state.handle.take() {
            handle.abort();
            debug!("Refresh timer disarmed");
        }
    }

    /// True while a timer is pending and not yet fired
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state.lock().handle.is_some()
    }

    /// Delay the pending timer was armed with
    #[must_use]
    pub fn scheduled_delay(&self) -> Option<Duration> {
        self.state.lock().delay
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::scheduler.
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
    }

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() -> std::future::Ready<()> + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let captured = Arc::clone(&count);
        (count, move || {
            captured.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        })
    }

    /// Validates `refresh_delay` for a token with ten minutes left.
    ///
    /// Assertions:
    /// - The delay is ten minutes minus the one minute margin (540 000 ms).
    #[test]
    fn test_delay_ten_minutes() {
        let delay = refresh_delay(now() + chrono::Duration::minutes(10), now());
        assert_eq!(delay, Duration::from_millis(540_000));
    }

    #[test]
    fn test_delay_short_lifetime_uses_half() {
        let delay = refresh_delay(now() + chrono::Duration::seconds(30), now());
        assert_eq!(delay, Duration::from_millis(15_000));
    }

    #[test]
    fn test_delay_expired_token_uses_floor() {
        let delay = refresh_delay(now() - chrono::Duration::seconds(5), now());
        assert_eq!(delay, Duration::from_millis(MIN_REFRESH_DELAY_MS));

        let at_expiry = refresh_delay(now(), now());
        assert_eq!(at_expiry, Duration::from_millis(MIN_REFRESH_DELAY_MS));
    }

    #[test]
    fn test_half_life_only_after_expiry() {
        let expiration = now();
        assert!(!is_past_half_life(expiration, now() - chrono::Duration::seconds(10)));
        assert!(is_past_half_life(expiration, now()));
        assert!(is_past_half_life(expiration, now() + chrono::Duration::seconds(10)));
    }

    /// Validates the timer fire scenario.
    ///
    /// Assertions:
    /// - Nothing fires before the delay elapses.
    /// - The callback runs once and the timer reports itself unarmed.
    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once() {
        let timer = RefreshTimer::new();
        let (count, on_fire) = counter();

        timer.arm(Duration::from_millis(100), on_fire);
        assert!(timer.is_armed());
        assert_eq!(timer.scheduled_delay(), Some(Duration::from_millis(100)));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());
        assert!(timer.scheduled_delay().is_none());
    }

    /// Validates the re-arm scenario.
    ///
    /// Assertions:
    /// - The replaced timer never fires.
    /// - Only the latest timer fires.
    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_pending_timer() {
        let timer = RefreshTimer::new();
        let (first, first_fire) = counter();
        let (second, second_fire) = counter();

        timer.arm(Duration::from_millis(100), first_fire);
        timer.arm(Duration::from_millis(200), second_fire);

        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_cancels() {
        let timer = RefreshTimer::new();
        let (count, on_fire) = counter();

        timer.arm(Duration::from_millis(100), on_fire);
        timer.disarm();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!timer.is_armed());
    }

    /// Validates a callback that re-arms its own timer.
    ///
    /// Assertions:
    /// - The callback is not aborted by its own re-arm.
    /// - The re-armed timer is pending afterwards.
    #[tokio::test(start_paused = true)]
    async fn test_callback_can_rearm() {
        let timer = RefreshTimer::new();
        let count = Arc::new(AtomicUsize::new(0));

        let inner_timer = timer.clone();
        let inner_count = Arc::clone(&count);
        timer.arm(Duration::from_millis(10), move || async move {
            inner_timer.arm(Duration::from_secs(60), || async {});
            inner_count.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(timer.is_armed());
        assert_eq!(timer.scheduled_delay(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_arm_without_runtime_is_ignored() {
        let timer = RefreshTimer::new();
        timer.arm(Duration::from_millis(10), || async {});
        assert!(!timer.is_armed());
    }
}
