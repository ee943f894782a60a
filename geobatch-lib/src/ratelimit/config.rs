use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{ErrorKind, Result};

/// Default number of requests per second, 10.
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 10.0;

/// Request rate shared by all workers of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum number of requests per second
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
        }
    }
}

const fn default_requests_per_second() -> f64 {
    DEFAULT_REQUESTS_PER_SECOND
}

impl RateLimitConfig {
    /// Create a config for the given rate
    #[must_use]
    pub const fn new(requests_per_second: f64) -> Self {
        Self {
            requests_per_second,
        }
    }

    /// Minimum spacing between two consecutive permits, `1 / rate`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Configuration`] if the rate is not a positive,
    /// finite number.
    pub fn interval(&self) -> Result<Duration> {
        let rate = self.requests_per_second;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ErrorKind::config(format!(
                "requests per second must be positive, got {rate}"
            )));
        }
        Duration::try_from_secs_f64(1.0 / rate)
            .map_err(|e| ErrorKind::config(format!("invalid request rate {rate}: {e}")))
    }
}
