//! Rate limiting - token bucket with a lock-free fast path
//!
//! Keeps the router from overwhelming the exchange. Tokens are stored in
//! milli-token fixed point inside an atomic, so the fast path is a pure CAS
//! loop; only the periodic refill takes a (tiny) mutex on the refill
//! timestamp.
//!
//! ```text
//! burst_capacity: 20 tokens, refill_rate: 10/interval, interval: 1s
//!
//! t=0.0s  [████████████████████] place 20 orders back to back
//! t=0.5s  [....................] 21st order suspends in acquire()
//! t=1.0s  [██████████..........] refill wakes it, order proceeds
//! ```
//!
//! `try_acquire` is the non-blocking fast path; `acquire` suspends until a
//! token arrives, the timeout expires, or shutdown is signalled. The wait is
//! driven by the tokio clock, so it cooperates with paused-clock tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::resilience::ShutdownSignal;

/// Milli-token fixed point: 1 token = 1000 units
const TOKEN_SCALE: u64 = 1000;

/// Rate limiter configuration
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    /// Bucket capacity: the largest burst the limiter will pass
    pub burst_capacity: u64,
    /// Tokens added per refill interval
    pub refill_rate: f64,
    /// Refill cadence
    pub refill_interval: Duration,
}

impl RateLimiterConfig {
    /// Conservative limits for production
    pub fn conservative() -> Self {
        Self {
            burst_capacity: 20,
            refill_rate: 10.0,
            refill_interval: Duration::from_secs(1),
        }
    }

    /// Standard limits
    pub fn standard() -> Self {
        Self {
            burst_capacity: 100,
            refill_rate: 100.0,
            refill_interval: Duration::from_secs(1),
        }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Outcome of a bounded `acquire` wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A token was consumed
    Acquired,
    /// No token arrived within the timeout
    TimedOut,
    /// Shutdown was signalled while waiting
    Cancelled,
}

/// Token bucket rate limiter
///
/// Cloning shares the bucket: all clones drain the same tokens.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    /// Available tokens in milli-token fixed point
    tokens: Arc<AtomicU64>,
    last_refill: Arc<Mutex<Instant>>,
    total_requests: Arc<AtomicU64>,
    total_allowed: Arc<AtomicU64>,
    total_rejected: Arc<AtomicU64>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            tokens: Arc::new(AtomicU64::new(config.burst_capacity * TOKEN_SCALE)),
            last_refill: Arc::new(Mutex::new(Instant::now())),
            total_requests: Arc::new(AtomicU64::new(0)),
            total_allowed: Arc::new(AtomicU64::new(0)),
            total_rejected: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Non-blocking fast path: consume one token if available
    pub fn try_acquire(&self) -> bool {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.refill();

        let mut current = self.tokens.load(Ordering::Acquire);
        loop {
            if current < TOKEN_SCALE {
                let rejected = self.total_rejected.fetch_add(1, Ordering::Relaxed) + 1;
                if rejected % 100 == 1 {
                    warn!(
                        allowed = self.total_allowed.load(Ordering::Relaxed),
                        requests = self.total_requests.load(Ordering::Relaxed),
                        "rate limit exceeded"
                    );
                }
                return false;
            }

            match self.tokens.compare_exchange_weak(
                current,
                current - TOKEN_SCALE,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.total_allowed.fetch_add(1, Ordering::Relaxed);
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Suspend until a token is available or `timeout` elapses
    ///
    /// Checks the shutdown signal between waits, so a cancellation aborts a
    /// pending sleep instead of letting it run out.
    pub async fn acquire(&self, timeout: Duration, shutdown: &ShutdownSignal) -> WaitOutcome {
        let deadline = Instant::now() + timeout;

        loop {
            if shutdown.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            if self.try_acquire() {
                return WaitOutcome::Acquired;
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(?timeout, "rate-limit wait expired");
                return WaitOutcome::TimedOut;
            }

            let wait = self.next_refill_in().max(Duration::from_millis(1));
            let wake_at = (now + wait).min(deadline);
            tokio::select! {
                _ = tokio::time::sleep_until(wake_at) => {}
                _ = shutdown.cancelled() => return WaitOutcome::Cancelled,
            }
        }
    }

    /// Time until the next refill is due
    fn next_refill_in(&self) -> Duration {
        let elapsed = self.last_refill.lock().elapsed();
        self.config.refill_interval.saturating_sub(elapsed)
    }

    /// Add tokens for every full interval elapsed since the last refill
    fn refill(&self) {
        let mut last_refill = self.last_refill.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(*last_refill);

        if elapsed < self.config.refill_interval {
            return;
        }

        let intervals = elapsed.as_secs_f64() / self.config.refill_interval.as_secs_f64();
        let tokens_to_add = (self.config.refill_rate * intervals * TOKEN_SCALE as f64) as u64;

        if tokens_to_add > 0 {
            let cap = self.config.burst_capacity * TOKEN_SCALE;
            let current = self.tokens.load(Ordering::Acquire);
            self.tokens
                .store((current + tokens_to_add).min(cap), Ordering::Release);
            *last_refill = now;
        }
    }

    /// Whole tokens currently available
    pub fn available_tokens(&self) -> u64 {
        self.tokens.load(Ordering::Acquire) / TOKEN_SCALE
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Acquire)
    }

    pub fn total_allowed(&self) -> u64 {
        self.total_allowed.load(Ordering::Acquire)
    }

    pub fn total_rejected(&self) -> u64 {
        self.total_rejected.load(Ordering::Acquire)
    }
}
