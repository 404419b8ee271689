//! Trade signals and the side/mode vocabulary shared across the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which way an order or signal trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// The exit side for a position entered on this side.
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    pub fn is_buy(self) -> bool {
        matches!(self, OrderSide::Buy)
    }
}

/// Whether a signal trades the underlying stock or an options contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeMode {
    Stock,
    Options,
}

impl TradeMode {
    /// Contract multiplier applied to every cash movement: 100 shares per
    /// options contract, 1 otherwise.
    pub fn multiplier(self) -> f64 {
        match self {
            TradeMode::Stock => 1.0,
            TradeMode::Options => 100.0,
        }
    }
}

/// An intent to trade, replayed against the bar stream.
///
/// Signals are matched to bars by exact timestamp equality; the price is
/// used as the limit-order entry price (the premium, in options mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub side: OrderSide,
    pub price: f64,
    pub strategy: String,
    pub mode: TradeMode,
}
