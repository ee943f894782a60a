use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

use super::RateLimitConfig;
use crate::Result;

/// Grants permits no closer together than a fixed interval.
///
/// The instant of the last granted permit is guarded by an async mutex.
/// A caller holds the lock while it sleeps, so waiting callers are served
/// one after another in the order they queued for the lock (tokio's mutex
/// is fair).
///
/// Share it between workers with an [`std::sync::Arc`].
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_granted: Mutex<Option<Instant>>,
    granted: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter for the given number of requests per second.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ErrorKind::Configuration`] if `requests_per_second`
    /// is not positive.
    pub fn new(requests_per_second: f64) -> Result<Self> {
        Self::from_config(RateLimitConfig::new(requests_per_second))
    }

    /// Create a limiter from a [`RateLimitConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::ErrorKind::Configuration`] if the configured rate is
    /// invalid.
    pub fn from_config(config: RateLimitConfig) -> Result<Self> {
        Ok(Self::with_interval(config.interval()?))
    }

    /// Create a limiter with an explicit minimum interval between permits
    #[must_use]
    pub const fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_granted: Mutex::const_new(None),
            granted: AtomicU64::new(0),
        }
    }

    /// The minimum spacing between two permits
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of permits handed out so far
    #[must_use]
    pub fn permits_granted(&self) -> u64 {
        self.granted.load(Ordering::Relaxed)
    }

    /// Wait until at least [`RateLimiter::interval`] has passed since the
    /// previous permit, then grant a new one.
    ///
    /// Returns the instant the permit was granted.
    pub async fn acquire(&self) -> Instant {
        let mut last = self.last_granted.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if Instant::now() < ready_at {
                sleep_until(ready_at).await;
            }
        }

        let now = Instant::now();
        *last = Some(now);
        self.granted.fetch_add(1, Ordering::Relaxed);
        now
    }
}
