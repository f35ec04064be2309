//! Exposure tracking - lock-free aggregates over a locked detail map
//!
//! The risk gate consults three aggregate values on every candidate order:
//! open position count, total notional exposure and daily realized P&L. All
//! three are plain atomics so the common-case checks never take a lock. The
//! per-symbol [`Position`] detail lives in a mutex-guarded map consulted only
//! by the per-symbol limit check and by fill processing.
//!
//! Consistency model: writers serialize on the map mutex; inside that
//! critical section the aggregates are updated first (atomic add/subtract),
//! then the map entry. A lock-free reader can therefore observe an aggregate
//! change microseconds before the matching detail row appears. Risk checks
//! tolerate this window; it only ever makes them more conservative or stale
//! by one fill.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::core::Symbol;
use crate::position::Position;

/// Lock-free view of the three aggregate exposure values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureAggregate {
    /// Number of open (non-flat) positions
    pub open_positions: u32,
    /// Sum of |quantity| x entry price across open positions, fixed-point
    pub total_notional: i64,
    /// Realized P&L accumulated since the last daily reset, fixed-point
    pub daily_realized_pnl: i64,
}

/// Aggregate exposure counters plus per-symbol position detail
#[derive(Debug, Default)]
pub struct ExposureTracker {
    open_positions: AtomicU32,
    total_notional: AtomicI64,
    daily_realized_pnl: AtomicI64,
    positions: Mutex<HashMap<Symbol, Position>>,
}

impl ExposureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one fill: aggregates first (atomic add/subtract), then the map
    ///
    /// Flattening a position decrements the open count and removes the map
    /// entry; the first fill for a symbol creates both.
    pub fn apply_fill(
        &self,
        symbol: Symbol,
        signed_quantity: i64,
        price: u64,
        realized_pnl_delta: i64,
    ) {
        let mut positions = self.positions.lock();

        let previous = positions.get(&symbol).copied();
        let mut position = previous.unwrap_or_else(|| Position::flat(symbol));
        let old_notional = position.notional().min(i64::MAX as u64) as i64;

        position.apply_fill(signed_quantity, price, realized_pnl_delta);
        let new_notional = position.notional().min(i64::MAX as u64) as i64;

        // Aggregates before the detail entry
        self.daily_realized_pnl
            .fetch_add(realized_pnl_delta, Ordering::AcqRel);
        self.total_notional
            .fetch_add(new_notional - old_notional, Ordering::AcqRel);

        if previous.is_none() && !position.is_flat() {
            self.open_positions.fetch_add(1, Ordering::AcqRel);
        } else if previous.is_some() && position.is_flat() {
            self.open_positions.fetch_sub(1, Ordering::AcqRel);
        }

        if position.is_flat() {
            debug!(symbol = %symbol, "position flattened");
            positions.remove(&symbol);
        } else {
            positions.insert(symbol, position);
        }
    }

    /// All three aggregates, read lock-free
    #[inline]
    pub fn get_aggregate(&self) -> ExposureAggregate {
        ExposureAggregate {
            open_positions: self.open_positions.load(Ordering::Relaxed),
            total_notional: self.total_notional.load(Ordering::Relaxed),
            daily_realized_pnl: self.daily_realized_pnl.load(Ordering::Relaxed),
        }
    }

    /// Open position count (lock-free, hot path)
    #[inline(always)]
    pub fn open_positions(&self) -> u32 {
        self.open_positions.load(Ordering::Relaxed)
    }

    /// Total notional exposure (lock-free, hot path)
    #[inline(always)]
    pub fn total_notional(&self) -> i64 {
        self.total_notional.load(Ordering::Relaxed)
    }

    /// Daily realized P&L (lock-free, hot path)
    #[inline(always)]
    pub fn daily_realized_pnl(&self) -> i64 {
        self.daily_realized_pnl.load(Ordering::Relaxed)
    }

    /// Per-symbol detail; takes the map lock
    pub fn get_position(&self, symbol: Symbol) -> Option<Position> {
        self.positions.lock().get(&symbol).copied()
    }

    /// Reset the daily realized P&L counter (start-of-day roll)
    pub fn reset_daily_pnl(&self) {
        self.daily_realized_pnl.store(0, Ordering::Release);
    }
}
