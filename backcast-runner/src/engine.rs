//! Replay orchestrator: merges bar and signal streams and drives the broker.
//!
//! The engine owns no global state. Strategy resolution goes through the
//! [`StrategyBook`] handed in at construction, and an unknown strategy is a
//! skip-and-count, never an unwind — no failure originating from a single
//! signal can abort the replay, which always runs to the final bar.
//!
//! Per bar, strictly in order: fills first, then signal admission, then the
//! equity sample. Signals match bars by exact timestamp equality; there is
//! no tolerance window.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use backcast_core::broker::SimulatedBroker;
use backcast_core::config::BacktestConfig;
use backcast_core::domain::{Bar, Order, OrderSide, OrderTag, OrderType, Signal, TradeMode};
use backcast_core::sizing::options_qty;
use backcast_core::strategy::{
    options_exit_prices, stock_bracket_prices, StrategyBook, StrategyConfig,
};

use crate::result::{EquityPoint, RunResult};

/// Main backtesting engine.
///
/// Holds only configuration; every [`run`](Self::run) constructs a fresh
/// broker, so independent runs over the same engine may be parallelized
/// freely.
#[derive(Debug, Clone)]
pub struct Engine {
    config: BacktestConfig,
    strategies: StrategyBook,
}

impl Engine {
    pub fn new(config: BacktestConfig, strategies: StrategyBook) -> Self {
        Self { config, strategies }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Execute the backtest over ascending-timestamp bar and signal streams.
    pub fn run(&self, bars: &[Bar], signals: &[Signal]) -> RunResult {
        let mut broker = SimulatedBroker::new(self.config.clone());

        // Index signals by exact timestamp for O(1) lookup per bar.
        let mut signal_index: HashMap<DateTime<Utc>, Vec<&Signal>> = HashMap::new();
        for signal in signals {
            signal_index.entry(signal.timestamp).or_default().push(signal);
        }

        let mut equity_curve = Vec::with_capacity(bars.len());
        let mut signals_processed = 0;
        let mut signals_skipped = 0;

        for bar in bars {
            // 1. Process fills on this bar.
            broker.on_bar(bar);

            // 2. Admit signals at this bar's timestamp.
            if let Some(bar_signals) = signal_index.get(&bar.timestamp) {
                for signal in bar_signals {
                    if !bar.ticker.is_empty() && signal.ticker != bar.ticker {
                        continue;
                    }

                    // Exposure counts open positions plus entries that are
                    // still waiting to fill.
                    let pending_entries = broker
                        .pending_orders()
                        .filter(|o| o.tag == OrderTag::Entry)
                        .count();
                    let exposure = broker.open_position_count() + pending_entries;
                    if self.config.max_open_positions > 0
                        && exposure >= self.config.max_open_positions
                    {
                        debug!(ticker = %signal.ticker, "skipping signal: position limit reached");
                        signals_skipped += 1;
                        continue;
                    }

                    match self.strategies.resolve(&signal.strategy) {
                        Ok(strategy) => {
                            self.process_signal(&mut broker, signal, strategy, bar);
                            signals_processed += 1;
                        }
                        Err(err) => {
                            warn!(%err, "skipping signal");
                            signals_skipped += 1;
                        }
                    }
                }
            }

            // 3. Record equity at bar close.
            equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity: broker.mark_to_market(bar),
                cash: broker.cash(),
                open_positions: broker.open_position_count(),
            });
        }

        // No carry-over past the replay window.
        broker.cancel_all_pending();

        RunResult {
            config: self.config.clone(),
            trades: broker.trades().to_vec(),
            equity_curve,
            open_positions: broker.open_positions().to_vec(),
            signals_processed,
            signals_skipped,
            bars_processed: bars.len(),
            start_time: bars.first().map(|b| b.timestamp),
            end_time: bars.last().map(|b| b.timestamp),
        }
    }

    fn process_signal(
        &self,
        broker: &mut SimulatedBroker,
        signal: &Signal,
        strategy: &StrategyConfig,
        bar: &Bar,
    ) {
        match signal.mode {
            TradeMode::Stock => self.submit_stock_bracket(broker, signal, strategy, bar),
            TradeMode::Options => self.submit_options_order(broker, signal, strategy, bar),
        }
    }

    /// Build and submit a stock bracket: limit entry + TP limit + SL stop.
    fn submit_stock_bracket(
        &self,
        broker: &mut SimulatedBroker,
        signal: &Signal,
        strategy: &StrategyConfig,
        bar: &Bar,
    ) {
        let (tp_price, stop_price, _stop_limit_price) =
            stock_bracket_prices(signal.price, signal.side, strategy);

        let qty = self.config.default_stock_qty;
        let exit_side = signal.side.opposite();

        let entry = Order::new(
            broker.next_order_id(),
            bar.timestamp,
            signal.ticker.clone(),
            signal.side,
            OrderType::Limit {
                limit_price: signal.price,
            },
            qty,
        )
        .tagged(OrderTag::Entry);
        let tp = Order::new(
            broker.next_order_id(),
            bar.timestamp,
            signal.ticker.clone(),
            exit_side,
            OrderType::Limit {
                limit_price: tp_price,
            },
            qty,
        )
        .tagged(OrderTag::TakeProfit);
        let sl = Order::new(
            broker.next_order_id(),
            bar.timestamp,
            signal.ticker.clone(),
            exit_side,
            OrderType::Stop { stop_price },
            qty,
        )
        .tagged(OrderTag::StopLoss);

        broker.submit_bracket_order(
            signal,
            entry,
            tp,
            sl,
            &strategy.name,
            TradeMode::Stock,
            tp_price,
            stop_price,
        );

        debug!(
            ticker = %signal.ticker,
            side = ?signal.side,
            entry = signal.price,
            tp = tp_price,
            sl = stop_price,
            "stock bracket submitted"
        );
    }

    /// Build and submit an options entry with TP/SL targets.
    ///
    /// The signal price stands in for the premium; targets are percentages
    /// of it, and the quantity comes from the dollar-risk sizer.
    fn submit_options_order(
        &self,
        broker: &mut SimulatedBroker,
        signal: &Signal,
        strategy: &StrategyConfig,
        bar: &Bar,
    ) {
        let premium = signal.price;
        let (tp_price, sl_price) = options_exit_prices(premium, signal.side, strategy);
        let qty = options_qty(self.config.max_dollar_risk, strategy.options_sl_pct, premium);

        // Always buying premium: calls for a buy signal, puts for a sell.
        let entry = Order::new(
            broker.next_order_id(),
            bar.timestamp,
            signal.ticker.clone(),
            OrderSide::Buy,
            OrderType::Limit {
                limit_price: premium,
            },
            qty,
        )
        .tagged(OrderTag::Entry);

        broker.submit_options_order(signal, entry, tp_price, sl_price, &strategy.name);

        debug!(
            ticker = %signal.ticker,
            premium,
            qty,
            tp = tp_price,
            sl = sl_price,
            "options order submitted"
        );
    }
}
