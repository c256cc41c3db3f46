//! Timed waits between viewer interactions.
//!
//! Viewers give no readiness signal, so most steps sleep for a fixed settle
//! delay. Tests swap in [`NoWait`].

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Settle delay after dismissing an overlay or opening a viewer
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Interval between page-count probes
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Number of page-count probes before giving up
pub const POLL_ATTEMPTS: usize = 5;

#[async_trait]
pub trait WaitPolicy: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepWait;

#[async_trait]
impl WaitPolicy for SleepWait {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWait;

#[async_trait]
impl WaitPolicy for NoWait {
    async fn pause(&self, _duration: Duration) {}
}

/// Run `probe` up to `attempts` times, pausing `interval` between tries,
/// until it yields a value.
pub async fn poll_until<T, F, Fut>(
    wait: &dyn WaitPolicy,
    attempts: usize,
    interval: Duration,
    mut probe: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=attempts {
        if let Some(value) = probe().await {
            return Some(value);
        }
        debug!("Probe attempt {}/{} came back empty", attempt, attempts);
        if attempt < attempts {
            wait.pause(interval).await;
        }
    }
    None
}
