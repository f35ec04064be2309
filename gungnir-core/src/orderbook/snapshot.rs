//! Immutable order book snapshots
//!
//! A snapshot is a point-in-time copy of the aggregated ladder, capped at a
//! caller-chosen depth. Consumers (slippage estimation, strategies) read
//! snapshots instead of the live book so the ingestion task never contends
//! with them.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::core::{Side, Symbol};
use crate::orderbook::depth;

/// One aggregated price level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Price, fixed-point (9 decimals)
    pub price: u64,
    /// Aggregate resting quantity at this price, fixed-point
    pub quantity: u64,
}

/// Point-in-time capture of one symbol's ladder
///
/// Bids are sorted descending, asks ascending; within a side all prices are
/// distinct. The sequence number is the book's logical clock at capture time,
/// so consumers can detect stale snapshots by comparing against the live
/// book's current sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub symbol: Symbol,
    /// Bid levels, best (highest) first
    pub bids: Vec<PriceLevel>,
    /// Ask levels, best (lowest) first
    pub asks: Vec<PriceLevel>,
    /// Book sequence number at capture time
    pub sequence: u64,
    pub captured_at: SystemTime,
}

impl OrderBookSnapshot {
    #[inline]
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.first().copied()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.first().copied()
    }

    /// Mid price, `None` unless both sides are present
    #[inline]
    pub fn mid_price(&self) -> Option<u64> {
        let bid = self.best_bid()?.price;
        let ask = self.best_ask()?.price;
        // Overflow-safe mid price calculation
        Some(bid / 2 + ask / 2 + (bid % 2 + ask % 2) / 2)
    }

    /// Spread in basis points, `None` unless both sides are present
    #[inline]
    pub fn spread_bps(&self) -> Option<u32> {
        let bid = self.best_bid()?.price;
        let ask = self.best_ask()?.price;
        Some(depth::spread_bps_from_prices(bid, ask))
    }

    /// Crossed snapshot (bid >= ask): a data-integrity condition
    #[inline]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => bid.price >= ask.price,
            _ => false,
        }
    }

    /// Total quantity across the top `n` levels of one side
    #[inline]
    pub fn depth(&self, side: Side, n: usize) -> u64 {
        match side {
            Side::Buy => depth::depth_quantity(&self.bids, n),
            Side::Sell => depth::depth_quantity(&self.asks, n),
        }
    }

    /// Volume-weighted average price over the top `n` levels of one side
    #[inline]
    pub fn vwap(&self, side: Side, n: usize) -> Option<u64> {
        match side {
            Side::Buy => depth::vwap_levels(&self.bids, n),
            Side::Sell => depth::vwap_levels(&self.asks, n),
        }
    }

    /// Imbalance over the top `n` levels, i64 fixed-point in [-1.0, 1.0]
    #[inline]
    pub fn imbalance(&self, n: usize) -> i64 {
        depth::imbalance_levels(&self.bids, &self.asks, n)
    }
}
