//! Order types and the order lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::OrderId;
use super::signal::OrderSide;

/// What kind of order and its price parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderType {
    /// Fills at the bar's open price.
    Market,
    /// Fills at the limit price when the bar range reaches it.
    Limit { limit_price: f64 },
    /// Triggers and fills at the stop price when the bar range reaches it.
    Stop { stop_price: f64 },
    /// Triggers under the stop condition, fills at the limit price when
    /// set, else at the stop price.
    StopLimit {
        stop_price: f64,
        limit_price: Option<f64>,
    },
}

/// Order lifecycle states. Status is monotonic: Filled and Cancelled are
/// terminal, and there is no transition out of either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// Role of an order within a bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTag {
    Entry,
    TakeProfit,
    StopLoss,
    None,
}

impl OrderTag {
    /// True for the exit legs of a bracket.
    pub fn is_exit(self) -> bool {
        matches!(self, OrderTag::TakeProfit | OrderTag::StopLoss)
    }
}

/// A simulated order managed by the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub timestamp: DateTime<Utc>,
    pub ticker: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub qty: u32,
    pub status: OrderStatus,
    pub fill_price: Option<f64>,
    pub fill_timestamp: Option<DateTime<Utc>>,
    /// Links bracket legs to their parent entry order.
    pub parent_id: Option<OrderId>,
    pub tag: OrderTag,
}

impl Order {
    pub fn new(
        id: OrderId,
        timestamp: DateTime<Utc>,
        ticker: impl Into<String>,
        side: OrderSide,
        order_type: OrderType,
        qty: u32,
    ) -> Self {
        Self {
            id,
            timestamp,
            ticker: ticker.into(),
            side,
            order_type,
            qty,
            status: OrderStatus::Pending,
            fill_price: None,
            fill_timestamp: None,
            parent_id: None,
            tag: OrderTag::None,
        }
    }

    pub fn tagged(mut self, tag: OrderTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_parent(mut self, parent: OrderId) -> Self {
        self.parent_id = Some(parent);
        self
    }
}
