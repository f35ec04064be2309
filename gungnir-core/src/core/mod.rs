//! Core domain types for the execution pipeline
//!
//! This module provides the fundamental building blocks shared by every stage
//! of the order path:
//! - `OrderId`: u128-based order identifiers (zero heap allocation)
//! - `Symbol`: interned u32 instrument identifier
//! - `Order`: immutable candidate order as emitted by a strategy
//! - `fixed_point`: 9-decimal fixed-point arithmetic helpers

pub mod types;

pub use types::{fixed_point, Order, OrderId, OrderType, Side, Symbol};
