//! Circuit breaker guarding one upstream service

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,   // Normal operation
    Open,     // Failing, reject requests
    HalfOpen, // One trial call allowed
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    consecutive_failures: usize,
    opened_at: Option<Instant>,
    /// Set while the single half-open trial call is outstanding
    trial_in_flight: bool,
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: usize,
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

/// Stops calling a service after repeated consecutive failures
#[derive(Debug)]
pub struct CircuitBreaker {
    service: &'static str,
    inner: Mutex<BreakerInner>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(service: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            service,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
            config,
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a call should be rejected right now.
    ///
    /// An open breaker whose reset timeout has elapsed moves to half-open and
    /// lets exactly one call through; others are rejected until that trial
    /// call is marked as a success or a failure.
    pub fn is_open(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => false,
            BreakerState::HalfOpen => {
                if inner.trial_in_flight {
                    true
                } else {
                    inner.trial_in_flight = true;
                    false
                }
            }
            BreakerState::Open => {
                let elapsed = inner
                    .opened_at
                    .map_or(true, |at| at.elapsed() >= self.config.reset_timeout);
                if elapsed {
                    inner.state = BreakerState::HalfOpen;
                    inner.trial_in_flight = true;
                    false
                } else {
                    true
                }
            }
        }
    }

    pub fn mark_success(&self) {
        let mut inner = self.lock();
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;
    }

    pub fn mark_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        inner.trial_in_flight = false;

        // A failed trial call re-opens immediately
        if inner.state == BreakerState::HalfOpen
            || inner.consecutive_failures >= self.config.failure_threshold
        {
            inner.state = BreakerState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> usize {
        self.lock().consecutive_failures
    }
}
