//! Execution-side domain types
//!
//! `ExchangeResponse` is what a successful dispatch returns; `Fill` is the
//! execution report that feeds position tracking. Transport failures are
//! typed so the router can tell transient faults (retry) from business
//! rejections (surface immediately).

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{OrderId, Side, Symbol};

/// Acknowledgement from the exchange for an accepted order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeResponse {
    /// Exchange-assigned identifier
    pub exchange_order_id: String,
    /// Client-side id the acknowledgement refers to
    pub client_order_id: OrderId,
    /// Quantity accepted, fixed-point
    pub accepted_quantity: u64,
    pub timestamp: SystemTime,
}

/// A trade execution reported by the exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    /// Execution price, fixed-point
    pub price: u64,
    /// Executed quantity, fixed-point
    pub quantity: u64,
    /// Realized P&L delta attributable to this fill, fixed-point
    pub realized_pnl: i64,
}

impl Fill {
    /// Signed position change: positive for buys, negative for sells
    #[inline]
    pub fn position_change(&self) -> i64 {
        match self.side {
            Side::Buy => self.quantity as i64,
            Side::Sell => -(self.quantity as i64),
        }
    }
}

/// Failure reported by the exchange transport for one dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection reset by peer")]
    ConnectionReset,

    #[error("server error (status {code})")]
    Server { code: u16 },

    /// The exchange understood the order and declined it
    #[error("order rejected by exchange: {reason}")]
    Rejected { reason: String },
}

impl TransportError {
    /// Transient failures are retried; business rejections never are
    #[inline]
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportError::Rejected { .. })
    }
}
