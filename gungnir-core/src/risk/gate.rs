//! Multi-level pre-trade risk validation
//!
//! `check` evaluates a candidate order against the configured limits and
//! never mutates anything: tracker state changes only when a real fill goes
//! through `ExposureTracker::apply_fill`.
//!
//! Checks run cheapest-first so the common rejection resolves without
//! touching a lock:
//!
//! ```text
//! 1. circuit breaker Open        (atomic read)
//! 2. open position count         (atomic read)
//! 3. daily realized loss         (atomic read)
//! 4. projected total notional    (atomic read)
//! 5. order notional              (pure arithmetic)
//! 6. per-symbol position limit   (position-map lock)
//! ```
//!
//! Only an order that survives steps 1-5 pays for the lock in step 6.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::core::Order;
use crate::position::{ExposureTracker, Position};
use crate::resilience::CircuitBreaker;
use crate::risk::RiskConfig;

/// Outcome of a risk check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Order may proceed to routing
    Approved,
    /// Order must not be dispatched
    Rejected(RejectReason),
}

impl Decision {
    #[inline]
    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approved)
    }
}

/// Reason for a risk rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Circuit breaker is open, nothing may trade
    CircuitOpen,
    /// Open position count at or above the limit
    OpenPositionsExceeded { open: u32, max: u32 },
    /// Daily realized loss at or beyond the limit
    DailyLossExceeded { pnl: i64, max_loss: i64 },
    /// Aggregate notional after this order would exceed the limit
    TotalExposureExceeded { projected: i64, limit: i64 },
    /// This order alone exceeds the per-order notional limit
    OrderTooLarge { notional: i64, limit: i64 },
    /// The symbol's position after this order would exceed the limit
    PositionLimitExceeded { projected: i64, limit: i64 },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::CircuitOpen => write!(f, "circuit breaker open"),
            RejectReason::OpenPositionsExceeded { open, max } => {
                write!(f, "open positions {} at limit {}", open, max)
            }
            RejectReason::DailyLossExceeded { pnl, max_loss } => {
                write!(f, "daily pnl {} beyond loss limit {}", pnl, max_loss)
            }
            RejectReason::TotalExposureExceeded { projected, limit } => {
                write!(f, "projected total notional {} over limit {}", projected, limit)
            }
            RejectReason::OrderTooLarge { notional, limit } => {
                write!(f, "order notional {} over limit {}", notional, limit)
            }
            RejectReason::PositionLimitExceeded { projected, limit } => {
                write!(f, "projected position notional {} over limit {}", projected, limit)
            }
        }
    }
}

/// Pre-trade risk gate shared by all strategy callers
pub struct RiskGate {
    config: RiskConfig,
    tracker: Arc<ExposureTracker>,
    breaker: Arc<CircuitBreaker>,
}

impl RiskGate {
    pub fn new(
        config: RiskConfig,
        tracker: Arc<ExposureTracker>,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            config,
            tracker,
            breaker,
        }
    }

    #[inline(always)]
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Validate a candidate order against the configured limits
    ///
    /// `reference_price` prices market orders (and projections); limit orders
    /// use their own price. The decision reflects tracker state at the
    /// instant of the read: a concurrent fill can invalidate an approval
    /// before dispatch, which is why the risk-to-dispatch window is kept
    /// short.
    pub fn check(&self, order: &Order, reference_price: u64) -> Decision {
        // 1. Breaker first: no arithmetic while the exchange is unhealthy.
        //    Read-only so the gate never races the router for a probe.
        if self.breaker.is_open() {
            return self.reject(order, RejectReason::CircuitOpen);
        }

        // 2. Open position count
        let open = self.tracker.open_positions();
        if open >= self.config.max_open_positions {
            return self.reject(
                order,
                RejectReason::OpenPositionsExceeded {
                    open,
                    max: self.config.max_open_positions,
                },
            );
        }

        // 3. Daily realized loss
        let pnl = self.tracker.daily_realized_pnl();
        if pnl <= -self.config.max_daily_loss {
            return self.reject(
                order,
                RejectReason::DailyLossExceeded {
                    pnl,
                    max_loss: self.config.max_daily_loss,
                },
            );
        }

        // 4. Projected aggregate notional
        let order_notional = order.notional(reference_price).min(i64::MAX as u64) as i64;
        let projected_total = self
            .tracker
            .total_notional()
            .saturating_add(order_notional);
        if projected_total > self.config.max_total_notional {
            return self.reject(
                order,
                RejectReason::TotalExposureExceeded {
                    projected: projected_total,
                    limit: self.config.max_total_notional,
                },
            );
        }

        // 5. Per-order notional
        if order_notional > self.config.max_order_notional {
            return self.reject(
                order,
                RejectReason::OrderTooLarge {
                    notional: order_notional,
                    limit: self.config.max_order_notional,
                },
            );
        }

        // 6. Per-symbol projection; the only check that pays for the lock
        let mut projected = self
            .tracker
            .get_position(order.symbol)
            .unwrap_or_else(|| Position::flat(order.symbol));
        projected.apply_fill(order.signed_quantity(), order.price_or(reference_price), 0);
        let projected_notional = projected.notional().min(i64::MAX as u64) as i64;
        if projected_notional > self.config.max_position_notional {
            return self.reject(
                order,
                RejectReason::PositionLimitExceeded {
                    projected: projected_notional,
                    limit: self.config.max_position_notional,
                },
            );
        }

        Decision::Approved
    }

    fn reject(&self, order: &Order, reason: RejectReason) -> Decision {
        debug!(order_id = %order.id, symbol = %order.symbol, %reason, "order rejected");
        Decision::Rejected(reason)
    }
}
