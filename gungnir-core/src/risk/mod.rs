//! Risk management - pre-trade limits and order-flow throttling
//!
//! ```text
//! Strategy -> RiskGate -------------------> OrderRouter -> Exchange
//!             1. breaker open   (atomic)    slippage gate
//!             2. open positions (atomic)    rate limiter
//!             3. daily loss     (atomic)    transport checks
//!             4. total notional (atomic)    dispatch + retry
//!             5. order notional (pure)
//!             6. symbol limit   (locked)
//! ```
//!
//! The gate is ordered so that the overwhelming majority of rejections
//! resolve on lock-free reads; only the per-symbol projection pays for the
//! position-map lock.

pub mod config;
pub mod gate;
pub mod rate_limiter;

pub use config::RiskConfig;
pub use gate::{Decision, RejectReason, RiskGate};
pub use rate_limiter::{RateLimiter, RateLimiterConfig, WaitOutcome};
