//! Depth analytics over price-level slices
//!
//! Zero-allocation, fixed-point calculations shared by the live book and by
//! snapshot consumers. All prices and quantities are u64 fixed-point
//! (9 decimal places); accumulation goes through u128 so a deep ladder cannot
//! overflow intermediate sums.

use crate::core::fixed_point::SCALE;
use crate::orderbook::snapshot::PriceLevel;

/// Calculate spread in basis points from raw best prices
///
/// Returns 0 when the bid is zero (empty or degenerate book).
#[inline(always)]
pub fn spread_bps_from_prices(bid_price: u64, ask_price: u64) -> u32 {
    if bid_price == 0 {
        return 0;
    }

    let spread = ask_price.saturating_sub(bid_price);
    let spread_bps = (spread as u128 * 10_000) / bid_price as u128;
    spread_bps as u32
}

/// Volume-weighted average price across the first `max_levels` levels
///
/// Returns `None` if there is no quantity within the range.
#[inline]
pub fn vwap_levels(levels: &[PriceLevel], max_levels: usize) -> Option<u64> {
    let max_levels = max_levels.min(levels.len());

    let mut total_value: u128 = 0;
    let mut total_quantity: u128 = 0;

    for level in &levels[..max_levels] {
        if level.quantity == 0 {
            break;
        }
        // price * quantity carries 18 decimals; kept until the final division
        total_value += level.price as u128 * level.quantity as u128;
        total_quantity += level.quantity as u128;
    }

    if total_quantity == 0 {
        return None;
    }

    Some((total_value / total_quantity) as u64)
}

/// Total quantity across the first `max_levels` levels
///
/// Clamps to u64::MAX instead of wrapping.
#[inline]
pub fn depth_quantity(levels: &[PriceLevel], max_levels: usize) -> u64 {
    let max_levels = max_levels.min(levels.len());

    let mut total: u128 = 0;
    for level in &levels[..max_levels] {
        total += level.quantity as u128;
    }

    if total > u64::MAX as u128 {
        u64::MAX
    } else {
        total as u64
    }
}

/// Order book imbalance over the top `max_levels` levels
///
/// `(bid_depth - ask_depth) / (bid_depth + ask_depth)` as i64 fixed-point
/// (9 decimals): +1.0 is pure bid pressure, -1.0 pure ask pressure, 0 when
/// both sides are empty.
#[inline]
pub fn imbalance_levels(bids: &[PriceLevel], asks: &[PriceLevel], max_levels: usize) -> i64 {
    let bid_quantity = depth_quantity(bids, max_levels) as u128;
    let ask_quantity = depth_quantity(asks, max_levels) as u128;

    let total = bid_quantity + ask_quantity;
    if total == 0 {
        return 0;
    }

    let numerator = bid_quantity as i128 - ask_quantity as i128;
    ((numerator * SCALE as i128) / total as i128) as i64
}
