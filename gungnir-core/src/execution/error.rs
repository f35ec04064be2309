//! Routing error taxonomy
//!
//! Every way `route()` can fail is a typed variant: configuration faults are
//! fatal and never retried, validation rejections are local and side-effect
//! free, transient transport faults are retried and only surface after the
//! attempt budget is spent, with the last cause attached.

use std::time::Duration;

use thiserror::Error;

use crate::core::Symbol;
use crate::execution::transport::ConfigurationError;
use crate::execution::types::TransportError;

/// Failure of one `route()` call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutingError {
    /// Fatal transport misconfiguration (unencrypted endpoint, missing
    /// credentials); surfaced immediately, never retried
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// No book has been seen for the order's symbol, so the slippage gate
    /// cannot run
    #[error("no order book for symbol {symbol}")]
    BookUnavailable { symbol: Symbol },

    /// Estimated market impact exceeds the configured tolerance
    #[error("estimated slippage {estimated_bps:.3} bps exceeds limit {max_bps} bps")]
    SlippageExceeded { estimated_bps: f64, max_bps: u32 },

    /// The book cannot fill the order within the estimator's walk depth
    #[error("insufficient book liquidity within {max_levels} levels")]
    InsufficientLiquidity { max_levels: usize },

    /// No rate-limit token became available within the wait budget
    #[error("no rate-limit token within {waited:?}")]
    RateLimitTimeout { waited: Duration },

    /// Circuit breaker is open; no transport call was made
    #[error("circuit breaker open")]
    CircuitOpen,

    /// The exchange declined the order for business reasons; never retried
    #[error("order rejected by exchange: {reason}")]
    BusinessRejection { reason: String },

    /// Transient failures exhausted the retry budget
    #[error("dispatch failed after {attempts} attempts: {last_error}")]
    RoutingFailed {
        attempts: u32,
        #[source]
        last_error: TransportError,
    },

    /// Shutdown was signalled while the call was suspended
    #[error("routing cancelled by shutdown")]
    Cancelled,
}
