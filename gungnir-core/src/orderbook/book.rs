//! Price-level book - aggregated per-symbol bid/ask ladder
//!
//! The book stores one aggregate quantity per distinct price, ordered, with:
//! - O(log n) level upsert/removal
//! - O(1)-amortized best bid/ask queries
//! - A per-symbol sequence number bumped on every effective mutation, giving
//!   consumers a logical clock for staleness detection
//! - A per-side storage cap; when exceeded the level farthest from the touch
//!   is evicted
//!
//! The book is written by a single market-data ingestion task and read by
//! many consumers through [`OrderBookSnapshot`] copies. A crossed book
//! (bid >= ask) is reported, never silently repaired: the upstream feed owns
//! that data-integrity problem.

use std::collections::BTreeMap;
use std::time::{Duration, Instant, SystemTime};

use dashmap::DashMap;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::warn;

use crate::core::{Side, Symbol};
use crate::orderbook::depth;
use crate::orderbook::snapshot::{OrderBookSnapshot, PriceLevel};

/// Default per-side storage cap
pub const DEFAULT_MAX_LEVELS: usize = 200;

/// Book-level data integrity errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BookError {
    #[error("book is crossed: best bid {bid} >= best ask {ask}")]
    Crossed { bid: u64, ask: u64 },
}

/// Aggregated bid/ask ladder for one symbol
#[derive(Debug)]
pub struct PriceLevelBook {
    symbol: Symbol,
    /// Bids keyed by price; best bid is the last (highest) key
    bids: BTreeMap<u64, u64>,
    /// Asks keyed by price; best ask is the first (lowest) key
    asks: BTreeMap<u64, u64>,
    /// Logical clock, bumped once per effective mutation
    sequence: u64,
    last_update: Instant,
    max_levels: usize,
}

impl PriceLevelBook {
    pub fn new(symbol: Symbol) -> Self {
        Self::with_max_levels(symbol, DEFAULT_MAX_LEVELS)
    }

    pub fn with_max_levels(symbol: Symbol, max_levels: usize) -> Self {
        Self {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            sequence: 0,
            last_update: Instant::now(),
            max_levels: max_levels.max(1),
        }
    }

    #[inline(always)]
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Current sequence number (logical clock)
    #[inline(always)]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Time since the last effective mutation
    #[inline]
    pub fn age(&self) -> Duration {
        self.last_update.elapsed()
    }

    /// Insert, update or remove (quantity = 0) a price level
    ///
    /// Returns the sequence number after the update. A no-op update (removing
    /// an absent level, re-asserting an identical quantity) leaves the book
    /// and its sequence untouched, so zero-quantity updates are idempotent.
    pub fn upsert_level(&mut self, side: Side, price: u64, quantity: u64) -> u64 {
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };

        let changed = if quantity == 0 {
            levels.remove(&price).is_some()
        } else {
            levels.insert(price, quantity) != Some(quantity)
        };

        if changed {
            if levels.len() > self.max_levels {
                // Evict the level farthest from the touch
                let farthest = match side {
                    Side::Buy => levels.keys().next().copied(),
                    Side::Sell => levels.keys().next_back().copied(),
                };
                if let Some(key) = farthest {
                    levels.remove(&key);
                }
            }

            self.sequence += 1;
            self.last_update = Instant::now();
        }

        self.sequence
    }

    /// Best bid as (price, quantity)
    #[inline]
    pub fn best_bid(&self) -> Option<(u64, u64)> {
        self.bids.iter().next_back().map(|(&p, &q)| (p, q))
    }

    /// Best ask as (price, quantity)
    #[inline]
    pub fn best_ask(&self) -> Option<(u64, u64)> {
        self.asks.iter().next().map(|(&p, &q)| (p, q))
    }

    /// Mid price, `None` unless both sides are present
    #[inline]
    pub fn mid_price(&self) -> Option<u64> {
        let (bid, _) = self.best_bid()?;
        let (ask, _) = self.best_ask()?;
        // Overflow-safe mid price calculation
        Some(bid / 2 + ask / 2 + (bid % 2 + ask % 2) / 2)
    }

    /// Spread in basis points, `None` unless both sides are present
    #[inline]
    pub fn spread_bps(&self) -> Option<u32> {
        let (bid, _) = self.best_bid()?;
        let (ask, _) = self.best_ask()?;
        Some(depth::spread_bps_from_prices(bid, ask))
    }

    /// Total quantity across the top `n` levels of one side
    pub fn depth(&self, side: Side, n: usize) -> u64 {
        let mut total: u128 = 0;
        for (_, &quantity) in self.side_iter(side).take(n) {
            total += quantity as u128;
        }
        if total > u64::MAX as u128 {
            u64::MAX
        } else {
            total as u64
        }
    }

    /// Imbalance over the top `n` levels: (bid - ask) / (bid + ask),
    /// i64 fixed-point in [-1.0, 1.0], 0 when both sides are empty
    pub fn imbalance(&self, n: usize) -> i64 {
        let bid_quantity = self.depth(Side::Buy, n) as u128;
        let ask_quantity = self.depth(Side::Sell, n) as u128;

        let total = bid_quantity + ask_quantity;
        if total == 0 {
            return 0;
        }

        let numerator = bid_quantity as i128 - ask_quantity as i128;
        ((numerator * crate::core::fixed_point::SCALE as i128) / total as i128) as i64
    }

    /// Number of stored bid levels
    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    /// Number of stored ask levels
    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    /// Crossed book (bid >= ask): a data-integrity condition
    #[inline]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => bid >= ask,
            _ => false,
        }
    }

    /// Locked book (bid == ask): rare but distinct from crossed
    #[inline]
    pub fn is_locked(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => bid == ask,
            _ => false,
        }
    }

    /// Surface a crossed book as an error for the caller to handle
    pub fn validate(&self) -> Result<(), BookError> {
        if let (Some((bid, _)), Some((ask, _))) = (self.best_bid(), self.best_ask()) {
            if bid >= ask {
                return Err(BookError::Crossed { bid, ask });
            }
        }
        Ok(())
    }

    /// Immutable snapshot capped at `max_levels` per side
    pub fn snapshot(&self, max_levels: usize) -> OrderBookSnapshot {
        let bids = self
            .bids
            .iter()
            .rev()
            .take(max_levels)
            .map(|(&price, &quantity)| PriceLevel { price, quantity })
            .collect();
        let asks = self
            .asks
            .iter()
            .take(max_levels)
            .map(|(&price, &quantity)| PriceLevel { price, quantity })
            .collect();

        OrderBookSnapshot {
            symbol: self.symbol,
            bids,
            asks,
            sequence: self.sequence,
            captured_at: SystemTime::now(),
        }
    }

    fn side_iter(&self, side: Side) -> Box<dyn Iterator<Item = (&u64, &u64)> + '_> {
        match side {
            Side::Buy => Box::new(self.bids.iter().rev()),
            Side::Sell => Box::new(self.asks.iter()),
        }
    }
}

/// Multi-symbol book container
///
/// One writer (the market-data ingestion task) calls `apply_update`; many
/// readers take snapshots. Books are created lazily on first update.
pub struct BookRegistry {
    books: DashMap<Symbol, RwLock<PriceLevelBook>>,
    max_levels: usize,
}

impl BookRegistry {
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_MAX_LEVELS)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            books: DashMap::new(),
            max_levels,
        }
    }

    /// Apply one parsed market-data update, returning the book's new sequence
    pub fn apply_update(&self, symbol: Symbol, side: Side, price: u64, quantity: u64) -> u64 {
        let entry = self.books.entry(symbol).or_insert_with(|| {
            RwLock::new(PriceLevelBook::with_max_levels(symbol, self.max_levels))
        });

        let mut book = entry.write();
        let sequence = book.upsert_level(side, price, quantity);
        if book.is_crossed() {
            // Surfaced, not corrected: the feed owns this integrity problem
            warn!(symbol = %symbol, sequence, "book is crossed after update");
        }
        sequence
    }

    /// Snapshot one symbol's book, `None` if no update has been seen yet
    pub fn snapshot(&self, symbol: Symbol, max_levels: usize) -> Option<OrderBookSnapshot> {
        self.books
            .get(&symbol)
            .map(|entry| entry.read().snapshot(max_levels))
    }

    /// Run a closure against one symbol's live book
    pub fn with_book<R>(&self, symbol: Symbol, f: impl FnOnce(&PriceLevelBook) -> R) -> Option<R> {
        self.books.get(&symbol).map(|entry| f(&entry.read()))
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl Default for BookRegistry {
    fn default() -> Self {
        Self::new()
    }
}
