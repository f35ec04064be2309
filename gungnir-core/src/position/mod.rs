//! Positions and exposure tracking
//!
//! [`Position`] is the per-symbol detail record: signed quantity, average
//! entry price and realized P&L, created on the first fill for a symbol and
//! removed when the quantity returns to zero. [`ExposureTracker`] aggregates
//! positions into three lock-free counters consulted on every risk check.

pub mod tracker;

pub use tracker::{ExposureAggregate, ExposureTracker};

use serde::{Deserialize, Serialize};

use crate::core::{fixed_point, Symbol};

/// Per-symbol position detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    /// Signed quantity, fixed-point: positive long, negative short
    pub quantity: i64,
    /// Average entry price, fixed-point; 0 when flat
    pub entry_price: u64,
    /// Realized P&L accumulated over this position's lifetime, fixed-point
    pub realized_pnl: i64,
}

impl Position {
    /// A flat position, as it exists just before its first fill
    pub fn flat(symbol: Symbol) -> Self {
        Self {
            symbol,
            quantity: 0,
            entry_price: 0,
            realized_pnl: 0,
        }
    }

    #[inline(always)]
    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }

    /// Notional exposure: |quantity| x average entry price
    #[inline]
    pub fn notional(&self) -> u64 {
        fixed_point::notional(self.entry_price, self.quantity.unsigned_abs())
    }

    /// Apply one fill to this position
    ///
    /// The realized P&L delta is supplied by the fill source; this method
    /// only maintains quantity and average entry:
    /// - opening or adding in the same direction blends the average entry
    /// - reducing leaves the entry untouched
    /// - a fill that crosses through zero re-opens at the fill price
    pub fn apply_fill(&mut self, signed_quantity: i64, price: u64, realized_pnl_delta: i64) {
        self.realized_pnl = self.realized_pnl.saturating_add(realized_pnl_delta);

        let old_quantity = self.quantity;
        let new_quantity = old_quantity.saturating_add(signed_quantity);

        if old_quantity == 0 {
            self.entry_price = price;
        } else if old_quantity.signum() == signed_quantity.signum() {
            // Adding to the position: quantity-weighted average entry
            let old_abs = old_quantity.unsigned_abs() as u128;
            let add_abs = signed_quantity.unsigned_abs() as u128;
            let blended = (old_abs * self.entry_price as u128 + add_abs * price as u128)
                / (old_abs + add_abs);
            self.entry_price = blended as u64;
        } else if old_quantity.signum() != new_quantity.signum() && new_quantity != 0 {
            // Crossed through zero: the residual opens at the fill price
            self.entry_price = price;
        }
        // Plain reduction keeps the existing average entry

        self.quantity = new_quantity;
        if new_quantity == 0 {
            self.entry_price = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(units: u64) -> u64 {
        units * 1_000_000_000
    }

    #[test]
    fn test_first_fill_opens_position() {
        let mut pos = Position::flat(Symbol::new(1));
        pos.apply_fill(1_000_000_000, price(100), 0);

        assert_eq!(pos.quantity, 1_000_000_000);
        assert_eq!(pos.entry_price, price(100));
        assert!(!pos.is_flat());
    }

    #[test]
    fn test_adding_blends_entry_price() {
        let mut pos = Position::flat(Symbol::new(1));
        pos.apply_fill(1_000_000_000, price(100), 0);
        pos.apply_fill(1_000_000_000, price(110), 0);

        assert_eq!(pos.quantity, 2_000_000_000);
        assert_eq!(pos.entry_price, price(105));
    }

    #[test]
    fn test_reducing_keeps_entry_price() {
        let mut pos = Position::flat(Symbol::new(1));
        pos.apply_fill(2_000_000_000, price(100), 0);
        pos.apply_fill(-1_000_000_000, price(120), 20_000_000_000);

        assert_eq!(pos.quantity, 1_000_000_000);
        assert_eq!(pos.entry_price, price(100));
        assert_eq!(pos.realized_pnl, 20_000_000_000);
    }

    #[test]
    fn test_flattening_clears_entry() {
        let mut pos = Position::flat(Symbol::new(1));
        pos.apply_fill(1_000_000_000, price(100), 0);
        pos.apply_fill(-1_000_000_000, price(105), 5_000_000_000);

        assert!(pos.is_flat());
        assert_eq!(pos.entry_price, 0);
        assert_eq!(pos.notional(), 0);
        // Realized P&L survives the flattening
        assert_eq!(pos.realized_pnl, 5_000_000_000);
    }

    #[test]
    fn test_crossing_through_zero_reopens_at_fill_price() {
        let mut pos = Position::flat(Symbol::new(1));
        pos.apply_fill(1_000_000_000, price(100), 0);
        // Sell 3.0 against a 1.0 long: now short 2.0 opened at the fill price
        pos.apply_fill(-3_000_000_000, price(110), 10_000_000_000);

        assert_eq!(pos.quantity, -2_000_000_000);
        assert_eq!(pos.entry_price, price(110));
    }

    #[test]
    fn test_notional() {
        let mut pos = Position::flat(Symbol::new(1));
        pos.apply_fill(-2_000_000_000, price(50_000), 0);

        // |-2.0| * 50_000 = 100_000
        assert_eq!(pos.notional(), price(100_000));
    }
}
