//! Simulated broker: order lifecycle, fill detection, position tracking,
//! and cash accounting.
//!
//! The broker advances one bar at a time via [`SimulatedBroker::on_bar`].
//! Orders live in an arena keyed by [`OrderId`]; the pending queue is a
//! plain `Vec<OrderId>` in insertion order, so a sweep over simultaneous
//! fills always resolves ties the same way (take-profit legs are queued
//! before stop-loss legs). Hash maps are never iterated directly.
//!
//! Bracket orders are three linked orders: a limit entry plus take-profit
//! (limit) and stop-loss (stop) legs. The legs stay dormant in the arena —
//! not in the pending queue — until the entry fills; from that point
//! exactly one of them can fill, and the instant it does the sibling is
//! cancelled. Options brackets follow the same path with synthesized
//! opposite-side legs and the 100x contract multiplier.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::BacktestConfig;
use crate::domain::{
    Bar, Order, OrderId, OrderSide, OrderStatus, OrderTag, OrderType, Position, PositionId,
    PositionStatus, Signal, Trade, TradeMode,
};
use crate::execution::{apply_slippage, fill_price};

/// The two exit legs of a bracket, keyed by the entry order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketLegs {
    pub take_profit: OrderId,
    pub stop_loss: OrderId,
}

/// Per-entry metadata carried into the eventual trade record.
#[derive(Debug, Clone)]
struct EntryMeta {
    strategy: String,
    mode: TradeMode,
    tp_price: f64,
    sl_price: f64,
}

/// Event-driven simulated broker.
///
/// Owns the order arena, open positions, cash balance, and trade history.
/// Each run constructs its own broker; nothing here is shared.
#[derive(Debug)]
pub struct SimulatedBroker {
    config: BacktestConfig,
    cash: f64,
    next_order_id: u64,
    next_position_id: u64,
    orders: HashMap<OrderId, Order>,
    pending: Vec<OrderId>,
    filled: Vec<OrderId>,
    cancelled: Vec<OrderId>,
    open_positions: Vec<Position>,
    closed_positions: Vec<Position>,
    trades: Vec<Trade>,
    bracket_legs: HashMap<OrderId, BracketLegs>,
    entry_signals: HashMap<OrderId, Signal>,
    entry_meta: HashMap<OrderId, EntryMeta>,
    /// Entry order id -> the position it opened.
    position_entry: HashMap<OrderId, PositionId>,
}

impl SimulatedBroker {
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            cash: config.initial_capital,
            config,
            next_order_id: 1,
            next_position_id: 1,
            orders: HashMap::new(),
            pending: Vec::new(),
            filled: Vec::new(),
            cancelled: Vec::new(),
            open_positions: Vec::new(),
            closed_positions: Vec::new(),
            trades: Vec::new(),
            bracket_legs: HashMap::new(),
            entry_signals: HashMap::new(),
            entry_meta: HashMap::new(),
            position_entry: HashMap::new(),
        }
    }

    /// Allocate the next order id. Ids are monotonic within a run, so two
    /// identical runs assign identical ids.
    pub fn next_order_id(&mut self) -> OrderId {
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        id
    }

    // ------------------------------------------------------------------
    // Order submission
    // ------------------------------------------------------------------

    /// Add an order to the pending queue. No fill check happens at
    /// submission time; the order waits for the next bar.
    pub fn submit_order(&mut self, mut order: Order) -> OrderId {
        order.status = OrderStatus::Pending;
        let id = order.id;
        self.orders.insert(id, order);
        self.pending.push(id);
        id
    }

    /// Submit a bracket: entry plus TP and SL legs.
    ///
    /// Only the entry goes into the pending queue; the legs sit dormant in
    /// the arena until the entry fills. Returns the entry order id.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_bracket_order(
        &mut self,
        signal: &Signal,
        entry: Order,
        mut tp: Order,
        mut sl: Order,
        strategy: &str,
        mode: TradeMode,
        tp_price: f64,
        sl_price: f64,
    ) -> OrderId {
        let entry_id = entry.id;
        tp.parent_id = Some(entry_id);
        sl.parent_id = Some(entry_id);

        self.bracket_legs.insert(
            entry_id,
            BracketLegs {
                take_profit: tp.id,
                stop_loss: sl.id,
            },
        );
        self.entry_signals.insert(entry_id, signal.clone());
        self.entry_meta.insert(
            entry_id,
            EntryMeta {
                strategy: strategy.to_string(),
                mode,
                tp_price,
                sl_price,
            },
        );

        self.orders.insert(tp.id, tp);
        self.orders.insert(sl.id, sl);
        self.submit_order(entry)
    }

    /// Submit an options entry with TP/SL targets.
    ///
    /// Synthesizes limit/stop exit legs on the opposite side of the
    /// entry, then delegates to the bracket path in options mode.
    pub fn submit_options_order(
        &mut self,
        signal: &Signal,
        entry: Order,
        tp_price: f64,
        sl_price: f64,
        strategy: &str,
    ) -> OrderId {
        let exit_side = entry.side.opposite();
        let tp = Order::new(
            self.next_order_id(),
            entry.timestamp,
            entry.ticker.clone(),
            exit_side,
            OrderType::Limit {
                limit_price: tp_price,
            },
            entry.qty,
        )
        .tagged(OrderTag::TakeProfit);
        let sl = Order::new(
            self.next_order_id(),
            entry.timestamp,
            entry.ticker.clone(),
            exit_side,
            OrderType::Stop {
                stop_price: sl_price,
            },
            entry.qty,
        )
        .tagged(OrderTag::StopLoss);

        self.submit_bracket_order(
            signal,
            entry,
            tp,
            sl,
            strategy,
            TradeMode::Options,
            tp_price,
            sl_price,
        )
    }

    // ------------------------------------------------------------------
    // Bar processing
    // ------------------------------------------------------------------

    /// Process one price bar: sweep the pending queue for fills.
    ///
    /// The sweep runs over a snapshot of the queue, so orders activated
    /// during the sweep (bracket legs released by an entry fill) are not
    /// eligible until the next bar, and an order can never fill twice on
    /// one bar. A leg cancelled mid-sweep by its sibling's fill is skipped
    /// — status is monotonic.
    pub fn on_bar(&mut self, bar: &Bar) {
        let sweep: Vec<OrderId> = self.pending.clone();
        for id in sweep {
            let raw_price = {
                let Some(order) = self.orders.get(&id) else {
                    continue;
                };
                if order.status != OrderStatus::Pending {
                    continue;
                }
                if !order.ticker.is_empty() && order.ticker != bar.ticker {
                    continue;
                }
                match fill_price(order, bar) {
                    Some(price) => price,
                    None => continue,
                }
            };
            self.fill_order(id, raw_price, bar);
        }

        let Self {
            pending, orders, ..
        } = self;
        pending.retain(|id| {
            orders
                .get(id)
                .is_some_and(|o| o.status == OrderStatus::Pending)
        });
    }

    fn fill_order(&mut self, id: OrderId, raw_price: f64, bar: &Bar) {
        let Some(order) = self.orders.get_mut(&id) else {
            return;
        };
        let fill = apply_slippage(raw_price, order.side, self.config.slippage_pct);
        order.status = OrderStatus::Filled;
        order.fill_price = Some(fill);
        order.fill_timestamp = Some(bar.timestamp);

        let tag = order.tag;
        let qty = order.qty;
        let side = order.side;
        let ticker = order.ticker.clone();
        let parent_id = order.parent_id;
        self.filled.push(id);

        if tag.is_exit() {
            self.handle_exit_fill(id, parent_id, &ticker, qty, fill, bar);
        } else if parent_id.is_none() || tag == OrderTag::Entry {
            self.handle_entry_fill(id, &ticker, side, qty, fill, bar);
        }
        // An untagged child fill books nothing; the order is just recorded
        // as filled.
    }

    fn handle_entry_fill(
        &mut self,
        entry_id: OrderId,
        ticker: &str,
        side: OrderSide,
        qty: u32,
        fill: f64,
        bar: &Bar,
    ) {
        let mode = self
            .entry_meta
            .get(&entry_id)
            .map(|m| m.mode)
            .unwrap_or(TradeMode::Stock);
        let cost = fill * qty as f64 * mode.multiplier() + self.config.commission_per_fill;
        self.cash -= cost;

        let position = Position {
            id: PositionId(self.next_position_id),
            ticker: ticker.to_string(),
            side,
            qty,
            entry_price: fill,
            entry_timestamp: bar.timestamp,
            exit_price: None,
            exit_timestamp: None,
            status: PositionStatus::Open,
            mode,
        };
        self.next_position_id += 1;
        self.position_entry.insert(entry_id, position.id);
        self.open_positions.push(position);

        // Release the bracket legs: size them to the entry fill and move
        // them into the pending queue. This is when TP/SL exposure begins.
        if let Some(legs) = self.bracket_legs.get(&entry_id).copied() {
            for leg_id in [legs.take_profit, legs.stop_loss] {
                if let Some(leg) = self.orders.get_mut(&leg_id) {
                    leg.qty = qty;
                }
                self.pending.push(leg_id);
            }
        }

        debug!(
            ticker,
            ?side,
            qty,
            fill,
            cash = self.cash,
            "entry filled"
        );
    }

    fn handle_exit_fill(
        &mut self,
        exit_id: OrderId,
        parent_id: Option<OrderId>,
        ticker: &str,
        qty: u32,
        fill: f64,
        bar: &Bar,
    ) {
        // Primary: entry id -> position id linkage. Fallback: first open
        // position on the same ticker — deliberately permissive so a fill
        // with partial bookkeeping still closes something sensible.
        let index = parent_id
            .and_then(|p| self.position_entry.get(&p).copied())
            .and_then(|pid| self.open_positions.iter().position(|pos| pos.id == pid))
            .or_else(|| {
                self.open_positions
                    .iter()
                    .position(|pos| pos.ticker == ticker)
            });
        let Some(index) = index else {
            warn!(ticker, order = %exit_id, "exit fill with no matching open position");
            return;
        };

        let meta = parent_id.and_then(|p| self.entry_meta.get(&p));
        let mode = meta.map(|m| m.mode).unwrap_or(TradeMode::Stock);
        let proceeds = fill * qty as f64 * mode.multiplier() - self.config.commission_per_fill;
        self.cash += proceeds;

        let mut position = self.open_positions.remove(index);
        position.exit_price = Some(fill);
        position.exit_timestamp = Some(bar.timestamp);
        position.status = PositionStatus::Closed;

        // Cancel the sibling leg, if it is still live.
        if let Some(parent) = parent_id {
            if let Some(legs) = self.bracket_legs.get(&parent).copied() {
                let sibling = if exit_id == legs.take_profit {
                    legs.stop_loss
                } else {
                    legs.take_profit
                };
                if let Some(sib) = self.orders.get_mut(&sibling) {
                    if sib.status == OrderStatus::Pending {
                        sib.status = OrderStatus::Cancelled;
                        self.cancelled.push(sibling);
                    }
                }
            }
        }

        // Record the complete trade using the stored entry metadata.
        if let Some(parent) = parent_id {
            if let Some(signal) = self.entry_signals.get(&parent).cloned() {
                let meta = self.entry_meta.get(&parent);
                self.trades.push(Trade {
                    signal,
                    position: position.clone(),
                    entry_order_id: parent,
                    exit_order_id: exit_id,
                    strategy: meta.map(|m| m.strategy.clone()).unwrap_or_default(),
                    mode,
                    take_profit_price: meta.map(|m| m.tp_price).unwrap_or(0.0),
                    stop_loss_price: meta.map(|m| m.sl_price).unwrap_or(0.0),
                });
            }
        }

        debug!(
            ticker,
            qty,
            fill,
            pnl = position.realized_pnl().unwrap_or(0.0),
            cash = self.cash,
            "exit filled"
        );
        self.closed_positions.push(position);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Cash plus open positions valued at their entry price. A rough
    /// estimate; use [`mark_to_market`](Self::mark_to_market) with the
    /// latest bar for a real valuation.
    pub fn equity(&self) -> f64 {
        let open_value: f64 = self
            .open_positions
            .iter()
            .map(Position::entry_notional)
            .sum();
        self.cash + open_value
    }

    /// Total equity with open positions valued at the bar's close.
    /// Positions on a different ticker fall back to their entry price.
    pub fn mark_to_market(&self, bar: &Bar) -> f64 {
        let mut total = self.cash;
        for pos in &self.open_positions {
            if !pos.ticker.is_empty() && pos.ticker != bar.ticker {
                total += pos.entry_notional();
            } else {
                total += bar.close * pos.qty as f64 * pos.mode.multiplier();
            }
        }
        total
    }

    pub fn open_position_count(&self) -> usize {
        self.open_positions.len()
    }

    /// Cancel every pending order. Returns the number cancelled.
    pub fn cancel_all_pending(&mut self) -> usize {
        let mut count = 0;
        for id in std::mem::take(&mut self.pending) {
            if let Some(order) = self.orders.get_mut(&id) {
                if order.status == OrderStatus::Pending {
                    order.status = OrderStatus::Cancelled;
                    self.cancelled.push(id);
                    count += 1;
                }
            }
        }
        count
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    /// Pending orders in queue (insertion) order.
    pub fn pending_orders(&self) -> impl Iterator<Item = &Order> {
        self.pending.iter().filter_map(|id| self.orders.get(id))
    }

    /// Filled orders in fill order.
    pub fn filled_orders(&self) -> impl Iterator<Item = &Order> {
        self.filled.iter().filter_map(|id| self.orders.get(id))
    }

    /// Cancelled orders in cancellation order.
    pub fn cancelled_orders(&self) -> impl Iterator<Item = &Order> {
        self.cancelled.iter().filter_map(|id| self.orders.get(id))
    }

    pub fn open_positions(&self) -> &[Position] {
        &self.open_positions
    }

    pub fn closed_positions(&self) -> &[Position] {
        &self.closed_positions
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// The bracket legs registered for an entry order, if any.
    pub fn bracket_legs(&self, entry_id: OrderId) -> Option<BracketLegs> {
        self.bracket_legs.get(&entry_id).copied()
    }
}
