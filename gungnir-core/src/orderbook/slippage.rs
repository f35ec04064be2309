//! Market-impact slippage estimation
//!
//! Walks the opposite side of a book snapshot from best to worst price,
//! simulating the fill of a candidate order, and reports the cost of the
//! resulting volume-weighted fill price against a reference price in basis
//! points. The walk is bounded: if the configured level depth is exhausted
//! before the order is filled, the estimate is `InsufficientLiquidity` rather
//! than a guess.
//!
//! For a fixed snapshot the estimate is monotone in order quantity: walking
//! deeper can only worsen the average fill price.

use tracing::debug;

use crate::core::fixed_point::SCALE;
use crate::core::{Order, Side};
use crate::orderbook::snapshot::OrderBookSnapshot;

/// Outcome of a slippage estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlippageResult {
    /// Estimated cost in basis points, fixed-point (9 decimals)
    Estimate(u64),
    /// The walk exhausted its level budget before the order quantity filled
    InsufficientLiquidity,
}

impl SlippageResult {
    /// Estimate in fixed-point bps, `None` for insufficient liquidity
    #[inline]
    pub fn bps(&self) -> Option<u64> {
        match self {
            SlippageResult::Estimate(bps) => Some(*bps),
            SlippageResult::InsufficientLiquidity => None,
        }
    }

    /// Estimate as f64 bps for display and threshold comparison
    #[inline]
    pub fn bps_f64(&self) -> Option<f64> {
        self.bps().map(|bps| bps as f64 / SCALE as f64)
    }
}

/// Estimator configuration
#[derive(Debug, Clone, Copy)]
pub struct SlippageConfig {
    /// Maximum number of levels walked per estimate
    pub max_levels: usize,
}

impl Default for SlippageConfig {
    fn default() -> Self {
        Self { max_levels: 10 }
    }
}

/// Walks book snapshots to price the market impact of candidate orders
#[derive(Debug, Clone, Copy, Default)]
pub struct SlippageEstimator {
    config: SlippageConfig,
}

impl SlippageEstimator {
    pub fn new(config: SlippageConfig) -> Self {
        Self { config }
    }

    #[inline(always)]
    pub fn config(&self) -> &SlippageConfig {
        &self.config
    }

    /// Estimate the execution cost of `order` against `snapshot`
    ///
    /// The reference price is the best opposite-side price, or the order's
    /// limit price when that is tighter. Zero-quantity orders cost zero by
    /// definition.
    pub fn estimate(&self, order: &Order, snapshot: &OrderBookSnapshot) -> SlippageResult {
        if order.quantity == 0 {
            return SlippageResult::Estimate(0);
        }

        let levels = match order.side {
            Side::Buy => &snapshot.asks,
            Side::Sell => &snapshot.bids,
        };

        let Some(best) = levels.first() else {
            debug!(symbol = %order.symbol, side = %order.side, "empty opposite side");
            return SlippageResult::InsufficientLiquidity;
        };

        let reference = match (order.side, order.limit_price) {
            (Side::Buy, Some(limit)) => best.price.min(limit),
            (Side::Sell, Some(limit)) => best.price.max(limit),
            _ => best.price,
        };
        if reference == 0 {
            return SlippageResult::InsufficientLiquidity;
        }

        let mut remaining = order.quantity;
        let mut filled_value: u128 = 0;
        let mut filled_quantity: u128 = 0;

        for level in levels.iter().take(self.config.max_levels) {
            if level.quantity == 0 {
                continue;
            }
            let take = remaining.min(level.quantity);
            filled_value += level.price as u128 * take as u128;
            filled_quantity += take as u128;
            remaining -= take;
            if remaining == 0 {
                break;
            }
        }

        if remaining > 0 {
            debug!(
                symbol = %order.symbol,
                side = %order.side,
                quantity = order.quantity,
                unfilled = remaining,
                max_levels = self.config.max_levels,
                "insufficient liquidity within walk depth"
            );
            return SlippageResult::InsufficientLiquidity;
        }

        let vwap = (filled_value / filled_quantity) as u64;
        let diff = vwap.abs_diff(reference);
        let bps = (diff as u128 * 10_000 * SCALE as u128) / reference as u128;

        SlippageResult::Estimate(bps.min(u64::MAX as u128) as u64)
    }
}
