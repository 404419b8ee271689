//! Fill detection: would this order have filled on this bar?
//!
//! The rules are deliberately conservative. An order fills at its *target*
//! price, never at a more favorable bar extreme — a limit buy at 99 on a
//! bar with low 98 fills at 99.00, not 98.00. Anything else injects
//! optimistic bias into every backtest that touches a limit order.

use crate::domain::{Bar, Order, OrderSide, OrderType};

/// Raw fill price (before slippage) for `order` against `bar`, or `None`
/// when the bar's range never reaches the order's price.
pub fn fill_price(order: &Order, bar: &Bar) -> Option<f64> {
    match order.order_type {
        OrderType::Market => Some(bar.open),
        OrderType::Limit { limit_price } => match order.side {
            OrderSide::Buy if bar.low <= limit_price => Some(limit_price),
            OrderSide::Sell if bar.high >= limit_price => Some(limit_price),
            _ => None,
        },
        OrderType::Stop { stop_price } => match order.side {
            // Stop sell is the long stop-loss; stop buy covers a short.
            OrderSide::Sell if bar.low <= stop_price => Some(stop_price),
            OrderSide::Buy if bar.high >= stop_price => Some(stop_price),
            _ => None,
        },
        OrderType::StopLimit {
            stop_price,
            limit_price,
        } => {
            let triggered = match order.side {
                OrderSide::Sell => bar.low <= stop_price,
                OrderSide::Buy => bar.high >= stop_price,
            };
            if triggered {
                Some(limit_price.unwrap_or(stop_price))
            } else {
                None
            }
        }
    }
}
