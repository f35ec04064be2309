//! Retry policy with exponential backoff and jitter
//!
//! Transient dispatch failures are retried on a bounded, exponentially
//! growing delay schedule. Jitter spreads concurrent retriers out so a
//! recovering exchange is not hit by a synchronized wave.

use std::time::Duration;

use rand::Rng;

/// Bounded retry schedule for transient dispatch failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total dispatch attempts, including the first (>= 1)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Ceiling for any single delay
    pub max_delay: Duration,
    /// Growth factor per retry (typically 2.0)
    pub multiplier: f64,
    /// Randomization width, 0.0 to 1.0: each delay is scaled by a factor
    /// drawn uniformly from [1 - jitter/2, 1 + jitter/2]
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Tight delays, few attempts (for testing)
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(500),
            multiplier: 1.5,
            jitter: 0.1,
        }
    }

    /// Wide delays, larger budget (for production)
    pub fn conservative() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }

    /// Delay before retry number `retry` (0-based), jittered
    ///
    /// Retry 0 waits `base_delay`, retry 1 waits `base_delay * multiplier`,
    /// and so on, capped at `max_delay` before jitter is applied.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = self.multiplier.powi(retry.min(63) as i32);
        let raw = self.base_delay.as_secs_f64() * exponent;
        let capped = raw.min(self.max_delay.as_secs_f64());

        if self.jitter <= 0.0 {
            return Duration::from_secs_f64(capped);
        }

        let spread = rand::thread_rng().gen::<f64>() * self.jitter;
        let factor = 1.0 + (spread - self.jitter / 2.0);
        Duration::from_secs_f64(capped * factor)
    }
}
