//! Backcast Core — the simulated-execution engine.
//!
//! This crate contains the heart of the signal-replay backtester:
//! - Domain types (bars, signals, orders, positions, trades)
//! - The simulated broker: order lifecycle state machine, per-bar fill
//!   sweep, bracket management, cash accounting
//! - Execution rules: fill detection against OHLC ranges, adverse slippage
//! - Strategy configuration and bracket-price math
//! - Options position sizing
//!
//! The replay orchestrator and performance analytics live in
//! `backcast-runner`.

pub mod broker;
pub mod config;
pub mod domain;
pub mod execution;
pub mod sizing;
pub mod strategy;
