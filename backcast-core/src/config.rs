//! Settings for a backtest run.

use serde::{Deserialize, Serialize};

/// Settings shared by the broker and the replay engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting cash balance in dollars.
    pub initial_capital: f64,
    /// Flat commission charged on every fill (entry and exit alike).
    pub commission_per_fill: f64,
    /// Simulated slippage as a percentage of the fill price, applied
    /// adversely (buys fill higher, sells lower).
    pub slippage_pct: f64,
    /// Shares per stock signal.
    pub default_stock_qty: u32,
    /// Maximum dollar risk per options trade, fed to the position sizer.
    pub max_dollar_risk: f64,
    /// Concurrent open-position cap; 0 means unlimited.
    pub max_open_positions: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            commission_per_fill: 0.0,
            slippage_pct: 0.0,
            default_stock_qty: 1,
            max_dollar_risk: 50.0,
            max_open_positions: 0,
        }
    }
}
