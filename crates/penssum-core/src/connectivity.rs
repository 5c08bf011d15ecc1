//! Connectivity monitor
//!
//! Keeps the client's belief about network reachability. A check that
//! finds the service unreachable schedules a recurring re-check at a
//! fixed interval; the first successful check cancels it.
//!
//! ```text
//!   check() ──► probe ──► reachable? ──yes──► Connected, cancel RetryTimer
//!                              │
//!                              no / probe error
//!                              ▼
//!                        Disconnected, ensure RetryTimer (every interval: check())
//! ```
//!
//! Invariant: a `RetryTimer` is live exactly while the belief is
//! `Disconnected`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::Stream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::models::ConnectivityState;

/// A single reachability test
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self) -> GatewayResult<bool>;
}

/// Probes the remote service with a `HEAD` request
///
/// Any HTTP answer, whatever its status, means the network is up.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: &str, timeout: Duration) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| GatewayError::Transport {
                endpoint: url.to_string(),
                source,
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn probe(&self) -> GatewayResult<bool> {
        self.client
            .head(&self.url)
            .send()
            .await
            .map(|_| true)
            .map_err(|source| GatewayError::Transport {
                endpoint: self.url.clone(),
                source,
            })
    }
}

/// Handle to the scheduled re-check task
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct RetryTimer {
    handle: JoinHandle<()>,
}

impl RetryTimer {
    fn spawn<F>(task: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(task),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Tracks reachability and owns the retry timer
pub struct ConnectivityMonitor {
    probe: Arc<dyn ReachabilityProbe>,
    interval: Duration,
    belief: watch::Sender<ConnectivityState>,
    retry: Mutex<Option<RetryTimer>>,
}

impl ConnectivityMonitor {
    pub fn new(probe: Arc<dyn ReachabilityProbe>, interval: Duration) -> Arc<Self> {
        let (belief, _) = watch::channel(ConnectivityState::Unknown);
        Arc::new(Self {
            probe,
            interval,
            belief,
            retry: Mutex::new(None),
        })
    }

    /// Current belief
    pub fn state(&self) -> ConnectivityState {
        *self.belief.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Watch belief changes (every check notifies, even if unchanged)
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.belief.subscribe()
    }

    /// Stream of reachability results
    ///
    /// Starts with the current belief when it is known, then yields the
    /// result of every later check. Each call returns an independent
    /// stream; it ends only when the monitor is dropped.
    pub fn events(&self) -> impl Stream<Item = bool> + Send + 'static {
        let mut rx = self.belief.subscribe();
        rx.mark_changed();

        futures_util::stream::unfold(rx, |mut rx| async move {
            loop {
                rx.changed().await.ok()?;
                let state = *rx.borrow_and_update();
                if let Some(reachable) = state.as_bool() {
                    return Some((reachable, rx));
                }
            }
        })
    }

    /// Probe once and update the belief
    ///
    /// A failed probe counts as disconnected. Disconnected ensures the
    /// retry timer runs; connected cancels it.
    pub async fn check(self: &Arc<Self>) -> bool {
        let reachable = match self.probe.probe().await {
            Ok(reachable) => reachable,
            Err(e) => {
                debug!("Reachability probe failed: {}", e);
                false
            }
        };

        let next = ConnectivityState::from_reachable(reachable);
        let previous = self.belief.send_replace(next);
        if previous != next {
            match next {
                ConnectivityState::Connected => info!("Connectivity restored"),
                _ => warn!("Connectivity lost, re-checking every {:?}", self.interval),
            }
        }

        if reachable {
            self.stop_polling();
        } else {
            self.start_polling();
        }

        reachable
    }

    /// Ensure the retry timer is running (no-op if it already is)
    pub fn start_polling(self: &Arc<Self>) {
        let mut retry = self.retry_slot();
        if retry.as_ref().is_some_and(RetryTimer::is_active) {
            return;
        }

        let monitor = Arc::downgrade(self);
        let interval = self.interval;
        *retry = Some(RetryTimer::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(monitor) = monitor.upgrade() else {
                    break;
                };
                if monitor.check().await {
                    break;
                }
            }
        }));
        debug!("Retry timer scheduled");
    }

    /// Cancel the retry timer if one is pending
    pub fn stop_polling(&self) {
        if let Some(timer) = self.retry_slot().take() {
            drop(timer);
            debug!("Retry timer cancelled");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.retry_slot()
            .as_ref()
            .is_some_and(RetryTimer::is_active)
    }

    fn retry_slot(&self) -> MutexGuard<'_, Option<RetryTimer>> {
        self.retry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Probe whose answer is flipped by the test
    #[derive(Default)]
    pub(crate) struct FakeProbe {
        pub reachable: AtomicBool,
        pub fail: AtomicBool,
        pub calls: AtomicUsize,
    }

    impl FakeProbe {
        pub fn new(reachable: bool) -> Arc<Self> {
            let probe = Self::default();
            probe.reachable.store(reachable, Ordering::SeqCst);
            Arc::new(probe)
        }

        pub fn set(&self, reachable: bool) {
            self.reachable.store(reachable, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReachabilityProbe for FakeProbe {
        async fn probe(&self) -> GatewayResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(GatewayError::Status {
                    endpoint: "/".to_string(),
                    status: 503,
                });
            }
            Ok(self.reachable.load(Ordering::SeqCst))
        }
    }

    fn monitor(probe: &Arc<FakeProbe>) -> Arc<ConnectivityMonitor> {
        ConnectivityMonitor::new(probe.clone(), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state_unknown() {
        let probe = FakeProbe::new(true);
        let monitor = monitor(&probe);
        assert_eq!(monitor.state(), ConnectivityState::Unknown);
        assert!(!monitor.is_polling());
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connected_check_schedules_nothing() {
        let probe = FakeProbe::new(true);
        let monitor = monitor(&probe);

        assert!(monitor.check().await);
        assert_eq!(monitor.state(), ConnectivityState::Connected);
        assert!(!monitor.is_polling());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnected_rechecks_every_interval() {
        let probe = FakeProbe::new(false);
        let monitor = monitor(&probe);

        assert!(!monitor.check().await);
        assert_eq!(monitor.state(), ConnectivityState::Disconnected);
        assert!(monitor.is_polling());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(probe.calls(), 4);
        assert!(monitor.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_regaining_connectivity_stops_timer() {
        let probe = FakeProbe::new(false);
        let monitor = monitor(&probe);
        monitor.check().await;

        probe.set(true);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(monitor.state(), ConnectivityState::Connected);
        assert!(!monitor.is_polling());
        assert_eq!(probe.calls(), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(probe.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_error_is_disconnected() {
        let probe = FakeProbe::new(true);
        probe.fail.store(true, Ordering::SeqCst);
        let monitor = monitor(&probe);

        assert!(!monitor.check().await);
        assert_eq!(monitor.state(), ConnectivityState::Disconnected);
        assert!(monitor.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_active_iff_disconnected() {
        let probe = FakeProbe::new(false);
        let monitor = monitor(&probe);

        for reachable in [false, false, true, false, true, true, false] {
            probe.set(reachable);
            monitor.check().await;
            assert_eq!(
                monitor.is_polling(),
                monitor.state() == ConnectivityState::Disconnected
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_timer_across_repeated_checks() {
        let probe = FakeProbe::new(false);
        let monitor = monitor(&probe);

        monitor.check().await;
        monitor.check().await;
        monitor.start_polling();
        let before = probe.calls();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        // One timer fired once
        assert_eq!(probe.calls(), before + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_monitor_cancels_timer() {
        let probe = FakeProbe::new(false);
        let monitor = monitor(&probe);
        monitor.check().await;
        drop(monitor);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_polling_is_idempotent() {
        let probe = FakeProbe::new(false);
        let monitor = monitor(&probe);
        monitor.check().await;

        monitor.stop_polling();
        monitor.stop_polling();
        assert!(!monitor.is_polling());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_stream() {
        let probe = FakeProbe::new(false);
        let monitor = monitor(&probe);
        let mut events = Box::pin(monitor.events());

        monitor.check().await;
        assert_eq!(events.next().await, Some(false));

        probe.set(true);
        monitor.check().await;
        assert_eq!(events.next().await, Some(true));

        // A fresh stream starts from the current belief
        let mut restarted = Box::pin(monitor.events());
        assert_eq!(restarted.next().await, Some(true));
    }
}
