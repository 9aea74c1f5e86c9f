//! Exponential backoff with uniform jitter.
//!
//! Delay before retrying after attempt `i` (0-indexed) is
//! `base_delay * 2^i + jitter` with `jitter` uniform in `[0, 1)` seconds.

use rand::Rng;
use std::time::Duration;
use tabforge_core::RetryConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub attempt_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.base_delay(),
            attempt_timeout: config.attempt_timeout(),
        }
    }

    /// Deterministic part of the delay plus the given jitter fraction
    pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let jitter = if jitter.is_finite() { jitter.clamp(0.0, 0.999_999) } else { 0.0 };
        self.base_delay.saturating_mul(factor) + Duration::from_secs_f64(jitter)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.0..1.0);
        self.delay_for(attempt, jitter)
    }

    pub fn is_last(&self, attempt: u32) -> bool {
        attempt + 1 >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
