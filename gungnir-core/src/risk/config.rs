//! Risk limits configuration
//!
//! Supplied pre-validated at construction time and never mutated by the
//! pipeline. All notional values are i64 fixed-point (9 decimals).

/// Risk limits applied to every candidate order
#[derive(Debug, Clone, Copy)]
pub struct RiskConfig {
    /// Maximum notional for a single order
    pub max_order_notional: i64,
    /// Maximum notional held in any one symbol
    pub max_position_notional: i64,
    /// Maximum total notional exposure across all symbols
    pub max_total_notional: i64,
    /// Maximum number of simultaneously open positions
    pub max_open_positions: u32,
    /// Maximum daily realized loss, as a positive magnitude
    pub max_daily_loss: i64,
    /// Maximum tolerated slippage estimate, whole basis points
    pub max_slippage_bps: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_order_notional: 50_000 * 1_000_000_000,
            max_position_notional: 250_000 * 1_000_000_000,
            max_total_notional: 1_000_000 * 1_000_000_000,
            max_open_positions: 20,
            max_daily_loss: 10_000 * 1_000_000_000,
            max_slippage_bps: 25,
        }
    }
}

impl RiskConfig {
    /// Small limits for cautious deployments
    pub fn conservative() -> Self {
        Self {
            max_order_notional: 5_000 * 1_000_000_000,
            max_position_notional: 25_000 * 1_000_000_000,
            max_total_notional: 100_000 * 1_000_000_000,
            max_open_positions: 5,
            max_daily_loss: 1_000 * 1_000_000_000,
            max_slippage_bps: 10,
        }
    }

    /// Wide limits for well-capitalized deployments
    pub fn aggressive() -> Self {
        Self {
            max_order_notional: 250_000 * 1_000_000_000,
            max_position_notional: 1_000_000 * 1_000_000_000,
            max_total_notional: 10_000_000 * 1_000_000_000,
            max_open_positions: 100,
            max_daily_loss: 100_000 * 1_000_000_000,
            max_slippage_bps: 50,
        }
    }
}
