//! Open and closed positions. Realized P&L is derived, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::PositionId;
use super::signal::{OrderSide, TradeMode};

/// Whether a position is still open or has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// A holding opened by an entry fill and closed by an exit fill.
///
/// `exit_timestamp`, when set, is always >= `entry_timestamp`: exits can
/// only fill on the entry bar or later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub ticker: String,
    pub side: OrderSide,
    pub qty: u32,
    pub entry_price: f64,
    pub entry_timestamp: DateTime<Utc>,
    pub exit_price: Option<f64>,
    pub exit_timestamp: Option<DateTime<Utc>>,
    pub status: PositionStatus,
    pub mode: TradeMode,
}

impl Position {
    /// Realized P&L, defined only once the position has an exit price.
    ///
    /// Longs earn `(exit - entry)`, shorts the reverse, scaled by quantity
    /// and the mode's contract multiplier.
    pub fn realized_pnl(&self) -> Option<f64> {
        let exit = self.exit_price?;
        let per_unit = match self.side {
            OrderSide::Buy => exit - self.entry_price,
            OrderSide::Sell => self.entry_price - exit,
        };
        Some(per_unit * self.qty as f64 * self.mode.multiplier())
    }

    /// Percentage P&L relative to the entry price, `None` while open or
    /// when the entry price is zero.
    pub fn pnl_pct(&self) -> Option<f64> {
        let exit = self.exit_price?;
        if self.entry_price == 0.0 {
            return None;
        }
        let pct = match self.side {
            OrderSide::Buy => (exit - self.entry_price) / self.entry_price,
            OrderSide::Sell => (self.entry_price - exit) / self.entry_price,
        };
        Some(pct * 100.0)
    }

    /// Notional value at the entry price, multiplier included.
    pub fn entry_notional(&self) -> f64 {
        self.entry_price * self.qty as f64 * self.mode.multiplier()
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_position(side: OrderSide, mode: TradeMode) -> Position {
        Position {
            id: PositionId(1),
            ticker: "AAPL".into(),
            side,
            qty: 10,
            entry_price: 100.0,
            entry_timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap(),
            exit_price: None,
            exit_timestamp: None,
            status: PositionStatus::Open,
            mode,
        }
    }

    #[test]
    fn pnl_is_none_while_open() {
        let pos = open_position(OrderSide::Buy, TradeMode::Stock);
        assert_eq!(pos.realized_pnl(), None);
        assert_eq!(pos.pnl_pct(), None);
    }

    #[test]
    fn long_stock_pnl() {
        let mut pos = open_position(OrderSide::Buy, TradeMode::Stock);
        pos.exit_price = Some(105.0);
        assert_eq!(pos.realized_pnl(), Some(50.0));
        assert_eq!(pos.pnl_pct(), Some(5.0));
    }

    #[test]
    fn short_stock_pnl() {
        let mut pos = open_position(OrderSide::Sell, TradeMode::Stock);
        pos.exit_price = Some(95.0);
        assert_eq!(pos.realized_pnl(), Some(50.0));
        assert_eq!(pos.pnl_pct(), Some(5.0));
    }

    #[test]
    fn options_pnl_uses_contract_multiplier() {
        let mut pos = open_position(OrderSide::Buy, TradeMode::Options);
        pos.exit_price = Some(101.5);
        // (101.5 - 100.0) * 10 contracts * 100 shares
        assert_eq!(pos.realized_pnl(), Some(1500.0));
    }

    #[test]
    fn entry_notional() {
        let pos = open_position(OrderSide::Buy, TradeMode::Options);
        assert_eq!(pos.entry_notional(), 100_000.0);
    }
}
