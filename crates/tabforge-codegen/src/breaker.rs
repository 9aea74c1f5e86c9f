//! Circuit breaker shared by every request of one engine instance.
//!
//! The breaker is open while `consecutive_failures >= failure_threshold` and
//! the last failure is more recent than `open_duration`. Once the duration has
//! elapsed the next gate check resets the counter and lets the call through;
//! there is no half-open trial phase.
//!
//! All reads and writes go through one mutex so the check-then-reset in
//! [`CircuitBreaker::try_acquire`] and the increments in
//! [`CircuitBreaker::record_failure`] never race.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tabforge_core::BreakerConfig;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
struct BreakerState {
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

/// Point-in-time view, for diagnostics endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    pub open_duration_secs: u64,
    pub open: bool,
    /// Milliseconds until the breaker lets a call through again
    pub retry_after_ms: Option<u64>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BreakerState::default()),
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // state is two plain fields, a poisoned guard is still consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn open_at(&self, state: &BreakerState, now: Instant) -> bool {
        if state.consecutive_failures < self.config.failure_threshold {
            return false;
        }
        match state.last_failure {
            Some(at) => now.duration_since(at) < self.config.open_duration(),
            None => false,
        }
    }

    /// Gate check before a call. Returns `false` while open; resets the
    /// counter when the open duration has elapsed.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        if self.open_at(&state, Instant::now()) {
            return false;
        }
        if state.consecutive_failures >= self.config.failure_threshold
            && state.consecutive_failures > 0
        {
            info!(
                failures = state.consecutive_failures,
                "circuit breaker open duration elapsed, resetting"
            );
            state.consecutive_failures = 0;
        }
        true
    }

    /// Read-only open check
    pub fn is_open(&self) -> bool {
        let state = self.lock();
        self.open_at(&state, Instant::now())
    }

    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        state.last_failure = Some(Instant::now());
        if state.consecutive_failures == self.config.failure_threshold {
            warn!(
                failures = state.consecutive_failures,
                open_secs = self.config.open_duration_secs,
                "circuit breaker opened"
            );
        }
    }

    pub fn record_success(&self) {
        self.lock().consecutive_failures = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let state = self.lock();
        let now = Instant::now();
        let open = self.open_at(&state, now);
        let retry_after_ms = match (open, state.last_failure) {
            (true, Some(at)) => {
                let remaining = self.config.open_duration().saturating_sub(now.duration_since(at));
                Some(remaining.as_millis() as u64)
            }
            _ => None,
        };
        BreakerSnapshot {
            consecutive_failures: state.consecutive_failures,
            failure_threshold: self.config.failure_threshold,
            open_duration_secs: self.config.open_duration_secs,
            open,
            retry_after_ms,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}
