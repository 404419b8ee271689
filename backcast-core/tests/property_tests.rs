//! Property tests for broker invariants.
//!
//! Uses proptest to verify:
//! 1. Fill prices never beat the order's target price
//! 2. Slippage is always adverse (and a no-op at zero)
//! 3. Bracket lifecycle — at most one exit leg fills, sibling cancelled
//! 4. Cash identity — cash + open notional = initial + realized P&L - commissions

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use backcast_core::broker::SimulatedBroker;
use backcast_core::config::BacktestConfig;
use backcast_core::domain::{
    Bar, Order, OrderId, OrderSide, OrderStatus, OrderTag, OrderType, Signal, TradeMode,
};
use backcast_core::execution::{apply_slippage, fill_price};

fn ts(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 21, 0, 0).unwrap() + Duration::days(day)
}

fn bar_at(day: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: ts(day),
        open,
        high,
        low,
        close,
        volume: 1_000_000.0,
        ticker: "SPY".into(),
    }
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// A sane OHLC bar: high/low bracket open and close.
fn arb_ohlc() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (85.0..115.0_f64, 85.0..115.0_f64, 0.0..5.0_f64, 0.0..5.0_f64).prop_map(
        |(open, close, up, down)| {
            let high = open.max(close) + up;
            let low = (open.min(close) - down).max(0.01);
            (open, high, low, close)
        },
    )
}

fn arb_price() -> impl Strategy<Value = f64> {
    (50.0..150.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

// ── 1. Fill prices never beat the target ─────────────────────────────

proptest! {
    /// A limit buy fills exactly at its limit price whenever the bar's low
    /// reaches it — never at the (more favorable) bar low.
    #[test]
    fn limit_buy_fills_at_limit_exactly(
        (open, high, low, close) in arb_ohlc(),
        limit in arb_price(),
    ) {
        let bar = bar_at(0, open, high, low, close);
        let order = Order::new(
            OrderId(1), ts(0), "SPY", OrderSide::Buy,
            OrderType::Limit { limit_price: limit }, 10,
        );
        match fill_price(&order, &bar) {
            Some(price) => {
                prop_assert!(bar.low <= limit);
                prop_assert_eq!(price, limit);
            }
            None => prop_assert!(bar.low > limit),
        }
    }

    /// Stop sells fill at the stop price, not the bar low.
    #[test]
    fn stop_sell_fills_at_stop_exactly(
        (open, high, low, close) in arb_ohlc(),
        stop in arb_price(),
    ) {
        let bar = bar_at(0, open, high, low, close);
        let order = Order::new(
            OrderId(1), ts(0), "SPY", OrderSide::Sell,
            OrderType::Stop { stop_price: stop }, 10,
        );
        match fill_price(&order, &bar) {
            Some(price) => prop_assert_eq!(price, stop),
            None => prop_assert!(bar.low > stop),
        }
    }
}

// ── 2. Slippage is adverse ───────────────────────────────────────────

proptest! {
    #[test]
    fn slippage_never_favors_the_order(price in arb_price(), pct in 0.0..2.0_f64) {
        let buy = apply_slippage(price, OrderSide::Buy, pct);
        let sell = apply_slippage(price, OrderSide::Sell, pct);
        // Cent rounding can move a tiny slip back to the raw price, but
        // never past it in the favorable direction.
        prop_assert!(buy >= price - 0.005);
        prop_assert!(sell <= price + 0.005);
    }

    #[test]
    fn zero_slippage_is_identity(price in arb_price()) {
        prop_assert_eq!(apply_slippage(price, OrderSide::Buy, 0.0), price);
        prop_assert_eq!(apply_slippage(price, OrderSide::Sell, 0.0), price);
    }
}

// ── 3 & 4. Bracket lifecycle and cash identity ───────────────────────

fn submit_long_bracket(broker: &mut SimulatedBroker, entry: f64, tp: f64, sl: f64) -> OrderId {
    let sig = Signal {
        timestamp: ts(0),
        ticker: "SPY".into(),
        side: OrderSide::Buy,
        price: entry,
        strategy: "bollinger_mean_reversion".into(),
        mode: TradeMode::Stock,
    };
    let entry_order = Order::new(
        broker.next_order_id(),
        ts(0),
        "SPY",
        OrderSide::Buy,
        OrderType::Limit { limit_price: entry },
        10,
    )
    .tagged(OrderTag::Entry);
    let tp_order = Order::new(
        broker.next_order_id(),
        ts(0),
        "SPY",
        OrderSide::Sell,
        OrderType::Limit { limit_price: tp },
        10,
    )
    .tagged(OrderTag::TakeProfit);
    let sl_order = Order::new(
        broker.next_order_id(),
        ts(0),
        "SPY",
        OrderSide::Sell,
        OrderType::Stop { stop_price: sl },
        10,
    )
    .tagged(OrderTag::StopLoss);
    broker.submit_bracket_order(
        &sig,
        entry_order,
        tp_order,
        sl_order,
        "bollinger_mean_reversion",
        TradeMode::Stock,
        tp,
        sl,
    )
}

proptest! {
    /// Replay a long bracket through an arbitrary bar sequence: at most one
    /// exit leg ends Filled, and when one does, the sibling is Cancelled.
    /// Cash plus open notional always reconciles with realized P&L and the
    /// commissions actually charged.
    #[test]
    fn bracket_invariants_hold_over_random_bars(
        bars in proptest::collection::vec(arb_ohlc(), 1..20),
    ) {
        let commission = 0.5;
        let mut broker = SimulatedBroker::new(BacktestConfig {
            commission_per_fill: commission,
            ..BacktestConfig::default()
        });
        let entry_id = submit_long_bracket(&mut broker, 100.0, 104.0, 96.0);

        for (day, (open, high, low, close)) in bars.into_iter().enumerate() {
            broker.on_bar(&bar_at(day as i64 + 1, open, high, low, close));
        }

        let legs = broker.bracket_legs(entry_id).unwrap();
        let tp_status = broker.order(legs.take_profit).unwrap().status;
        let sl_status = broker.order(legs.stop_loss).unwrap().status;

        // Never both filled.
        prop_assert!(
            !(tp_status == OrderStatus::Filled && sl_status == OrderStatus::Filled)
        );
        // One exit filled => the sibling is cancelled and the position closed.
        if tp_status == OrderStatus::Filled {
            prop_assert_eq!(sl_status, OrderStatus::Cancelled);
        }
        if sl_status == OrderStatus::Filled {
            prop_assert_eq!(tp_status, OrderStatus::Cancelled);
        }
        if tp_status == OrderStatus::Filled || sl_status == OrderStatus::Filled {
            prop_assert_eq!(broker.open_position_count(), 0);
            prop_assert_eq!(broker.trades().len(), 1);
        }

        // Cash identity.
        let fills = broker.filled_orders().count();
        let realized: f64 = broker.trades().iter().map(|t| t.pnl()).sum();
        let open_notional: f64 = broker
            .open_positions()
            .iter()
            .map(|p| p.entry_notional())
            .sum();
        let expected = 100_000.0 + realized - commission * fills as f64;
        prop_assert!((broker.cash() + open_notional - expected).abs() < 1e-6);
    }
}
