//! Retry with exponential backoff for transient provider failures

use super::{Completion, CompletionBackend};
use crate::error::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum retry attempts after the first request
    pub max_retries: u32,
    /// Base delay in milliseconds
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
    pub exponential_base: f64,
    /// Spread each delay by up to 25% either way
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// No retries at all
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (0-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.exponential_base.max(1.0).powi(attempt.min(32) as i32);
        let mut millis = (self.base_delay_ms as f64 * exp).min(self.max_delay_ms as f64);
        if self.jitter {
            millis *= rand::thread_rng().gen_range(0.75..=1.25);
        }
        Duration::from_millis(millis.round() as u64)
    }
}

/// Wraps a backend and retries transient failures
pub struct RetryingBackend<B> {
    inner: B,
    config: RetryConfig,
}

impl<B: CompletionBackend> RetryingBackend<B> {
    pub fn new(inner: B, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait::async_trait]
impl<B: CompletionBackend> CompletionBackend for RetryingBackend<B> {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<Completion> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(prompt, system).await {
                Ok(completion) => return Ok(completion),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = e
                        .retry_delay()
                        .unwrap_or_else(|| self.config.delay_for_attempt(attempt));
                    attempt += 1;
                    log::warn!(
                        "{} failed ({}), retry {}/{} in {:?}",
                        self.inner.name(),
                        e,
                        attempt,
                        self.config.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
