//! Zero-overhead core types for the execution path
//!
//! All types in this module are designed for:
//! - Zero heap allocations
//! - Copy semantics where possible
//! - Minimal memory footprint
//!
//! Prices and quantities are u64/i64 fixed-point with 9 decimal places
//! throughout the crate. `rust_decimal` is used only at the edges, via the
//! conversion helpers in [`fixed_point`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Interned instrument identifier
///
/// Uses u32 instead of a string symbol for copy semantics and cheap map keys.
/// The mapping from exchange symbol strings to ids is owned by the market-data
/// layer, outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Symbol(pub u32);

impl Symbol {
    #[inline(always)]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline(always)]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Symbol {
    #[inline(always)]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Unique identifier for an order
///
/// Uses u128 instead of String for zero-allocation, copy semantics.
/// Callers may assign their own ids; `generate()` produces one from
/// [timestamp:64][random:32][counter:32], unique across threads and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct OrderId(pub u128);

impl OrderId {
    #[inline(always)]
    pub const fn new(id: u128) -> Self {
        Self(id)
    }

    /// Generate a new random OrderId
    #[inline]
    pub fn generate() -> Self {
        use rand::Rng;
        use std::time::SystemTime;

        thread_local! {
            static COUNTER: std::cell::Cell<u32> = const { std::cell::Cell::new(0) };
            static RNG: std::cell::RefCell<rand::rngs::ThreadRng> =
                std::cell::RefCell::new(rand::thread_rng());
        }

        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);

        let random_part = RNG.with(|rng| rng.borrow_mut().gen::<u32>());

        let counter = COUNTER.with(|c| {
            let val = c.get();
            c.set(val.wrapping_add(1));
            val
        });

        let id = ((timestamp as u128) << 64) | ((random_part as u128) << 32) | (counter as u128);
        Self(id)
    }

    #[inline(always)]
    pub const fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl From<u128> for OrderId {
    #[inline(always)]
    fn from(id: u128) -> Self {
        Self(id)
    }
}

/// Order side (Buy or Sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
}

impl Side {
    /// The book side an aggressive order of this side consumes
    #[inline(always)]
    pub const fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderType {
    Limit = 0,
    Market = 1,
}

/// A candidate order as emitted by a strategy
///
/// Immutable once constructed: the pipeline never mutates an order, it only
/// approves, rejects or dispatches it. Fields are fixed-point (9 decimals).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    /// Quantity, fixed-point (must be > 0)
    pub quantity: u64,
    /// Limit price, fixed-point; `None` for market orders
    pub limit_price: Option<u64>,
}

impl Order {
    /// Create a new limit order with a generated id
    pub fn limit(symbol: Symbol, side: Side, price: u64, quantity: u64) -> Self {
        Self {
            id: OrderId::generate(),
            symbol,
            side,
            order_type: OrderType::Limit,
            quantity,
            limit_price: Some(price),
        }
    }

    /// Create a new market order with a generated id
    pub fn market(symbol: Symbol, side: Side, quantity: u64) -> Self {
        Self {
            id: OrderId::generate(),
            symbol,
            side,
            order_type: OrderType::Market,
            quantity,
            limit_price: None,
        }
    }

    /// Replace the generated id with a client-assigned one
    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = id;
        self
    }

    /// Signed quantity: positive for buys, negative for sells
    #[inline(always)]
    pub fn signed_quantity(&self) -> i64 {
        match self.side {
            Side::Buy => self.quantity as i64,
            Side::Sell => -(self.quantity as i64),
        }
    }

    /// Limit price if present, otherwise the supplied reference price
    #[inline(always)]
    pub fn price_or(&self, reference: u64) -> u64 {
        self.limit_price.unwrap_or(reference)
    }

    /// Notional value of this order at its limit price, or at the supplied
    /// reference price for market orders
    #[inline]
    pub fn notional(&self, reference: u64) -> u64 {
        fixed_point::notional(self.price_or(reference), self.quantity)
    }
}

/// Fixed-point conversion utilities
///
/// All prices and quantities use 9 decimal places.
pub mod fixed_point {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;

    /// Scale factor for 9 decimal places
    pub const SCALE: i64 = 1_000_000_000;

    /// Convert f64 to fixed-point i64
    #[inline(always)]
    pub fn from_f64(value: f64) -> i64 {
        (value * SCALE as f64) as i64
    }

    /// Convert fixed-point i64 to f64
    #[inline(always)]
    pub fn to_f64(value: i64) -> f64 {
        value as f64 / SCALE as f64
    }

    /// Convert a Decimal to fixed-point i64, `None` if out of range
    #[inline]
    pub fn from_decimal(value: Decimal) -> Option<i64> {
        (value * Decimal::from(SCALE)).to_i64()
    }

    /// Convert fixed-point i64 to Decimal
    #[inline]
    pub fn to_decimal(value: i64) -> Decimal {
        Decimal::from(value) / Decimal::from(SCALE)
    }

    /// Notional value (price x quantity) of two fixed-point values
    ///
    /// Accumulates in u128 and clamps to u64::MAX rather than wrapping.
    #[inline(always)]
    pub fn notional(price: u64, quantity: u64) -> u64 {
        let value = (price as u128 * quantity as u128) / SCALE as u128;
        if value > u64::MAX as u128 {
            u64::MAX
        } else {
            value as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_id_generation_unique() {
        let id1 = OrderId::generate();
        let id2 = OrderId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_order_id_display() {
        let id = OrderId::new(0x123456789abcdef0);
        assert_eq!(format!("{}", id), "0000000000000000123456789abcdef0");
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_enum_sizes() {
        assert_eq!(std::mem::size_of::<Side>(), 1);
        assert_eq!(std::mem::size_of::<OrderType>(), 1);
        assert_eq!(std::mem::size_of::<Symbol>(), 4);
    }

    #[test]
    fn test_limit_order_construction() {
        let order = Order::limit(Symbol::new(1), Side::Buy, 50_000_000_000_000, 100_000_000);

        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.limit_price, Some(50_000_000_000_000));
        assert_eq!(order.signed_quantity(), 100_000_000);
    }

    #[test]
    fn test_market_order_has_no_price() {
        let order = Order::market(Symbol::new(1), Side::Sell, 100_000_000);

        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.limit_price, None);
        assert_eq!(order.signed_quantity(), -100_000_000);
        // Falls back to the reference price
        assert_eq!(order.price_or(42), 42);
    }

    #[test]
    fn test_client_assigned_id() {
        let order =
            Order::market(Symbol::new(1), Side::Buy, 100_000_000).with_id(OrderId::new(7));
        assert_eq!(order.id, OrderId::new(7));
    }

    #[test]
    fn test_order_notional() {
        // 0.1 @ $50,000 = $5,000
        let order = Order::limit(Symbol::new(1), Side::Buy, 50_000_000_000_000, 100_000_000);
        assert_eq!(order.notional(0), 5_000_000_000_000);
    }

    #[test]
    fn test_fixed_point_roundtrip() {
        let price = 50000.123456789;
        let fixed = fixed_point::from_f64(price);
        let converted = fixed_point::to_f64(fixed);
        assert!((price - converted).abs() < 0.000001);
    }

    #[test]
    fn test_fixed_point_decimal_conversion() {
        let fixed = fixed_point::from_decimal(dec!(100.01)).unwrap();
        assert_eq!(fixed, 100_010_000_000);
        assert_eq!(fixed_point::to_decimal(fixed), dec!(100.01));
    }

    #[test]
    fn test_notional_clamps_on_overflow() {
        assert_eq!(fixed_point::notional(u64::MAX, u64::MAX), u64::MAX);
    }
}
