//! Trade — a complete round trip, the unit consumed by analytics.

use serde::{Deserialize, Serialize};

use super::ids::OrderId;
use super::position::Position;
use super::signal::{Signal, TradeMode};

/// A closed round-trip trade: the originating signal, the closed position,
/// the order ids of both legs, and the bracket targets that were in force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub signal: Signal,
    pub position: Position,
    pub entry_order_id: OrderId,
    pub exit_order_id: OrderId,
    pub strategy: String,
    pub mode: TradeMode,
    pub take_profit_price: f64,
    pub stop_loss_price: f64,
}

impl Trade {
    /// Realized P&L of the underlying position; 0 if the position somehow
    /// carries no exit price.
    pub fn pnl(&self) -> f64 {
        self.position.realized_pnl().unwrap_or(0.0)
    }
}
