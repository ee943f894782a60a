use crate::options::Config;
use anyhow::{Context, Result};
use geobatch_lib::{Client, ClientBuilder, RateLimiter};
use std::sync::Arc;

/// Creates a client according to the command-line config
pub(crate) fn create(cfg: &Config) -> Result<Client> {
    let rate_limiter = RateLimiter::new(cfg.requests_per_second)
        .context("Invalid `requests_per_second`")?;

    ClientBuilder::builder()
        .api_key(cfg.api_key.clone())
        .client_id(cfg.client_id.clone())
        .private_key(cfg.private_key())
        .channel(cfg.channel.clone())
        .mode(cfg.mode)
        .base_url(cfg.base_url.clone())
        .max_retries(cfg.max_retries)
        .retry_wait_time(cfg.retry_wait_time)
        .rate_limit_backoff(cfg.rate_limit_backoff)
        .timeout(cfg.timeout)
        .user_agent(cfg.user_agent.clone())
        .rate_limiter(Arc::new(rate_limiter))
        .build()
        .client()
        .context("Failed to create request client")
}
