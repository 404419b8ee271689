//! Domain types: bars, signals, orders, positions, trades, and ids.

pub mod bar;
pub mod ids;
pub mod order;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use ids::{OrderId, PositionId};
pub use order::{Order, OrderStatus, OrderTag, OrderType};
pub use position::{Position, PositionStatus};
pub use signal::{OrderSide, Signal, TradeMode};
pub use trade::Trade;
