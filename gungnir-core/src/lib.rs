//! Gungnir Core - Low-Latency Order Execution Pipeline
//!
//! Gungnir is the execution core of an algorithmic trading system: it keeps a
//! live price-level book per symbol, gates candidate orders through
//! multi-level risk checks, prices their market impact, and routes them to an
//! external exchange with rate limiting, bounded retry and circuit breaking.
//!
//! ## Architecture
//! - **Lock-free fast path**: aggregate exposure and breaker state are plain
//!   atomics, consulted on every candidate order without a lock
//! - **Fixed-point arithmetic**: u64/i64 with 9 decimal places end to end,
//!   u128 intermediates for notional math
//! - **Single-writer book**: one ingestion task mutates each ladder, readers
//!   work from immutable snapshots
//! - **Typed failures**: every rejection and fault is a typed result, never a
//!   panic
//!
//! ## Core Modules
//! - `core`: zero-overhead domain types (Order, OrderId, Symbol, fixed_point)
//! - `orderbook`: price-level ladders, snapshots, depth analytics, slippage
//! - `position`: per-symbol positions and lock-free exposure aggregates
//! - `risk`: pre-trade gate and token-bucket rate limiting
//! - `resilience`: circuit breaker, retry policy, cooperative shutdown
//! - `execution`: transport abstraction and the order router
//!
//! ## Order flow
//! ```text
//! market data -> BookRegistry::apply_update
//! strategy    -> RiskGate::check -> OrderRouter::route -> exchange
//!                     |                   |
//!               ExposureTracker     SlippageEstimator, RateLimiter,
//!               (atomics + map)     CircuitBreaker, RetryPolicy
//! fills       -> ExposureTracker::apply_fill
//! ```

pub mod core;
pub mod execution;
pub mod orderbook;
pub mod position;
pub mod resilience;
pub mod risk;
pub mod utils;

pub use crate::core::{fixed_point, Order, OrderId, OrderType, Side, Symbol};
pub use execution::{
    ExchangeResponse, ExchangeTransport, Fill, OrderRouter, RouterConfig, RoutingError,
    TransportConfig, TransportError,
};
pub use orderbook::{
    BookRegistry, OrderBookSnapshot, PriceLevel, PriceLevelBook, SlippageConfig,
    SlippageEstimator, SlippageResult,
};
pub use position::{ExposureAggregate, ExposureTracker, Position};
pub use risk::{Decision, RateLimiter, RateLimiterConfig, RejectReason, RiskConfig, RiskGate};
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryPolicy, ShutdownSignal,
};

// Re-export error types
pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::core::{fixed_point, Order, OrderId, OrderType, Side, Symbol};
    pub use crate::execution::{
        ExchangeTransport, OrderRouter, RouterConfig, RoutingError, TransportConfig,
    };
    pub use crate::orderbook::{BookRegistry, SlippageEstimator, SlippageResult};
    pub use crate::position::ExposureTracker;
    pub use crate::resilience::{CircuitBreaker, RetryPolicy, ShutdownSignal};
    pub use crate::risk::{Decision, RateLimiter, RiskConfig, RiskGate};
    pub use crate::{Error, Result};
}
