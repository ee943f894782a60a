//! Request pacing shared by all concurrent API calls.
//!
//! The remote API enforces a per-project request quota. Staying below it is
//! cheaper than backing off after a `429 Too Many Requests`, so every network
//! attempt (retries included) first waits for a permit from a single
//! [`RateLimiter`].
//!
//! # Architecture
//!
//! - [`RateLimiter`]: Grants permits no closer together than a fixed interval
//! - [`RateLimitConfig`]: The requested rate, validated into an interval

mod config;
mod limiter;

pub use config::{DEFAULT_REQUESTS_PER_SECOND, RateLimitConfig};
pub use limiter::RateLimiter;
