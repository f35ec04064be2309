//! Circuit breaker for isolating a failing exchange connection
//!
//! Three-state machine consulted on every routed order:
//! Closed (normal, consecutive failures counted) -> Open (all calls rejected
//! instantly while the cool-down runs) -> HalfOpen (one probe call admitted).
//! A successful probe closes the circuit and clears the failure counter; a
//! failed probe re-opens it and restarts the cool-down.
//!
//! State lives in an `AtomicU8` and the failure counter in an `AtomicU64`, so
//! the per-call gate is lock-free; only state transitions touch the timestamp
//! mutex.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

// The tokio clock falls back to real time outside a runtime, and cooperates
// with paused-clock tests inside one
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    /// Normal operation, requests pass through
    Closed = 0,
    /// Circuit tripped, requests fail fast
    Open = 1,
    /// Testing recovery with a single probe
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Open,
            2 => Self::HalfOpen,
            _ => Self::Closed,
        }
    }
}

/// Configuration for the circuit breaker
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u64,
    /// How long to stay Open before admitting a probe
    pub cool_down: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
        }
    }
}

impl CircuitBreakerConfig {
    /// Trips early, recovers fast (for testing)
    pub fn aggressive() -> Self {
        Self {
            failure_threshold: 3,
            cool_down: Duration::from_secs(5),
        }
    }

    /// Tolerates more failures, cools down longer (for production)
    pub fn conservative() -> Self {
        Self {
            failure_threshold: 10,
            cool_down: Duration::from_secs(60),
        }
    }
}

/// Failure-isolation state machine shared by every routing call
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Arc<AtomicU8>,
    failure_count: Arc<AtomicU64>,
    total_opens: Arc<AtomicU64>,
    /// Set once the single HalfOpen probe has been handed out
    probe_taken: Arc<AtomicBool>,
    last_state_change: Arc<parking_lot::Mutex<Instant>>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Arc::new(AtomicU8::new(CircuitState::Closed as u8)),
            failure_count: Arc::new(AtomicU64::new(0)),
            total_opens: Arc::new(AtomicU64::new(0)),
            probe_taken: Arc::new(AtomicBool::new(true)),
            last_state_change: Arc::new(parking_lot::Mutex::new(Instant::now())),
        }
    }

    /// Gate a call: true if it may proceed
    ///
    /// In Open state this transitions to HalfOpen once the cool-down has
    /// elapsed; in HalfOpen exactly one caller wins the probe, everyone else
    /// is rejected until the probe's outcome is recorded.
    pub fn is_call_permitted(&self) -> bool {
        match self.state.load(Ordering::Acquire).into() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = self.last_state_change.lock().elapsed();
                if elapsed < self.config.cool_down {
                    return false;
                }
                if self
                    .state
                    .compare_exchange(
                        CircuitState::Open as u8,
                        CircuitState::HalfOpen as u8,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
                {
                    debug!("circuit breaker half-open, admitting probe");
                    *self.last_state_change.lock() = Instant::now();
                    self.probe_taken.store(false, Ordering::Release);
                }
                self.take_probe()
            }
            CircuitState::HalfOpen => self.take_probe(),
        }
    }

    /// Read-only Open check: never transitions, never consumes the probe
    ///
    /// For gates (risk checks) that must observe breaker state without
    /// racing the router for the HalfOpen probe.
    pub fn is_open(&self) -> bool {
        match self.state.load(Ordering::Acquire).into() {
            CircuitState::Open => self.last_state_change.lock().elapsed() < self.config.cool_down,
            _ => false,
        }
    }

    /// Record a successful call
    pub fn record_success(&self) {
        match self.state.load(Ordering::Acquire).into() {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Release);
            }
            CircuitState::HalfOpen => {
                info!("circuit breaker probe succeeded, closing");
                self.transition_to(CircuitState::Closed);
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        match self.state.load(Ordering::Acquire).into() {
            CircuitState::Closed => {
                let failures = self.failure_count.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= self.config.failure_threshold {
                    warn!(failures, "circuit breaker tripped, opening");
                    self.transition_to(CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                warn!("circuit breaker probe failed, re-opening");
                self.transition_to(CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state.load(Ordering::Acquire).into()
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Acquire)
    }

    /// Total number of Closed/HalfOpen -> Open transitions
    pub fn total_opens(&self) -> u64 {
        self.total_opens.load(Ordering::Acquire)
    }

    /// Manual reset to Closed
    pub fn reset(&self) {
        info!("circuit breaker manually reset");
        self.transition_to(CircuitState::Closed);
    }

    /// Manual trip to Open
    pub fn force_open(&self) {
        warn!("circuit breaker manually forced open");
        self.transition_to(CircuitState::Open);
    }

    fn take_probe(&self) -> bool {
        self.probe_taken
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn transition_to(&self, state: CircuitState) {
        if state == CircuitState::Open {
            self.total_opens.fetch_add(1, Ordering::AcqRel);
        }
        if state == CircuitState::Closed {
            self.failure_count.store(0, Ordering::Release);
        }
        // No probe is outstanding outside HalfOpen
        self.probe_taken.store(true, Ordering::Release);
        self.state.store(state as u8, Ordering::Release);
        *self.last_state_change.lock() = Instant::now();
    }
}

impl Clone for CircuitBreaker {
    fn clone(&self) -> Self {
        Self {
            config: self.config,
            state: Arc::clone(&self.state),
            failure_count: Arc::clone(&self.failure_count),
            total_opens: Arc::clone(&self.total_opens),
            probe_taken: Arc::clone(&self.probe_taken),
            last_state_change: Arc::clone(&self.last_state_change),
        }
    }
}
