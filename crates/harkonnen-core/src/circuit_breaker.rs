use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::SourceError;

/// Circuit state for an upstream market data host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probing: bool,
    probe_seq: u64,
}

/// Stops hammering an upstream that keeps failing.
///
/// After `failure_threshold` consecutive failures every call is refused until
/// `open_timeout` has passed; then one probe is let through and its outcome
/// decides whether the circuit closes again.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    counters: Mutex<Counters>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Admits a call or explains why it is refused.
    ///
    /// The returned permit reports the call's outcome. A half-open probe whose
    /// permit is dropped without an outcome is released, so the next call
    /// probes again.
    pub fn admit(&self, upstream: &str) -> Result<CircuitPermit<'_>, SourceError> {
        let mut counters = self
            .counters
            .lock()
            .expect("circuit breaker lock is not poisoned");
        let Some(opened_at) = counters.opened_at else {
            return Ok(CircuitPermit {
                breaker: self,
                probe: None,
            });
        };

        if counters.probing || opened_at.elapsed() < self.config.open_timeout {
            return Err(SourceError::unavailable(format!(
                "{upstream} circuit breaker is open; skipping upstream call"
            )));
        }

        counters.probing = true;
        counters.probe_seq = counters.probe_seq.wrapping_add(1);
        Ok(CircuitPermit {
            breaker: self,
            probe: Some(counters.probe_seq),
        })
    }

    fn release_probe(&self, probe: u64) {
        let mut counters = self
            .counters
            .lock()
            .expect("circuit breaker lock is not poisoned");
        if counters.probing && counters.probe_seq == probe {
            counters.probing = false;
        }
    }

    pub fn record_success(&self) {
        let mut counters = self
            .counters
            .lock()
            .expect("circuit breaker lock is not poisoned");
        *counters = Counters {
            probe_seq: counters.probe_seq,
            ..Counters::default()
        };
    }

    pub fn record_failure(&self) {
        let mut counters = self
            .counters
            .lock()
            .expect("circuit breaker lock is not poisoned");
        counters.consecutive_failures = counters.consecutive_failures.saturating_add(1);

        if counters.probing || counters.consecutive_failures >= self.config.failure_threshold {
            counters.opened_at = Some(Instant::now());
            counters.probing = false;
        }
    }

    pub fn state(&self) -> CircuitState {
        let counters = self
            .counters
            .lock()
            .expect("circuit breaker lock is not poisoned");
        match (counters.opened_at, counters.probing) {
            (None, _) => CircuitState::Closed,
            (Some(_), true) => CircuitState::HalfOpen,
            (Some(_), false) => CircuitState::Open,
        }
    }
}

/// Admission granted by [`CircuitBreaker::admit`].
#[derive(Debug)]
#[must_use = "a permit should report the outcome of the call it admitted"]
pub struct CircuitPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe: Option<u64>,
}

impl CircuitPermit<'_> {
    pub fn is_probe(&self) -> bool {
        self.probe.is_some()
    }

    pub fn record_success(self) {
        self.breaker.record_success();
    }

    pub fn record_failure(self) {
        self.breaker.record_failure();
    }
}

impl Drop for CircuitPermit<'_> {
    fn drop(&mut self) {
        if let Some(probe) = self.probe {
            self.breaker.release_probe(probe);
        }
    }
}
