//! Strategy configuration and bracket-price computation.
//!
//! Each registered strategy carries stock TP/SL/stop-limit percentages
//! (applied to the entry price) and options TP/SL percentages (applied to
//! the premium). The registry is an explicit [`StrategyBook`] value owned
//! by the caller and passed into the engine — there is no global state,
//! and an unknown name is a plain `Err`, not a panic or unwind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::OrderSide;

/// Immutable configuration for a single trading strategy.
/// All percentages are in percent units (0.2 means 0.2%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    /// Stock take-profit, applied to the entry price.
    pub stock_tp_pct: f64,
    /// Stock stop-loss trigger price.
    pub stock_sl_pct: f64,
    /// Limit price for the stop leg, when a stop-limit is wanted.
    pub stock_stop_limit_pct: f64,
    /// Options take-profit as a percentage of premium.
    pub options_tp_pct: f64,
    /// Options stop-loss as a percentage of premium.
    pub options_sl_pct: f64,
}

/// A signal referenced a strategy that is not registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown strategy '{name}'; registered strategies: {registered}")]
pub struct UnknownStrategy {
    pub name: String,
    pub registered: String,
}

/// The strategy registry: name -> configuration, resolved per signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyBook {
    strategies: BTreeMap<String, StrategyConfig>,
}

impl StrategyBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two reference strategies with their stock defaults.
    pub fn builtin() -> Self {
        Self::from_configs([
            StrategyConfig {
                name: "bollinger_mean_reversion".into(),
                stock_tp_pct: 0.2,
                stock_sl_pct: 0.1,
                stock_stop_limit_pct: 0.15,
                options_tp_pct: 20.0,
                options_sl_pct: 10.0,
            },
            StrategyConfig {
                name: "lorentzian_classification".into(),
                stock_tp_pct: 1.0,
                stock_sl_pct: 0.8,
                stock_stop_limit_pct: 0.9,
                options_tp_pct: 50.0,
                options_sl_pct: 40.0,
            },
        ])
    }

    pub fn from_configs(configs: impl IntoIterator<Item = StrategyConfig>) -> Self {
        let mut book = Self::new();
        for config in configs {
            book.insert(config);
        }
        book
    }

    /// Register a strategy, replacing any previous entry with the same name.
    pub fn insert(&mut self, config: StrategyConfig) {
        self.strategies.insert(config.name.clone(), config);
    }

    /// Look up a strategy by name.
    pub fn resolve(&self, name: &str) -> Result<&StrategyConfig, UnknownStrategy> {
        self.strategies.get(name).ok_or_else(|| UnknownStrategy {
            name: name.to_string(),
            registered: self
                .strategies
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// Take-profit, stop, and stop-limit prices for a stock bracket.
///
/// Buys place the TP above and the SL below the entry; sells mirror that.
/// Prices are raw — rounding is the caller's concern.
pub fn stock_bracket_prices(
    entry_price: f64,
    side: OrderSide,
    config: &StrategyConfig,
) -> (f64, f64, f64) {
    let tp_mult = config.stock_tp_pct / 100.0;
    let sl_mult = config.stock_sl_pct / 100.0;
    let sl_limit_mult = config.stock_stop_limit_pct / 100.0;

    match side {
        OrderSide::Buy => (
            entry_price * (1.0 + tp_mult),
            entry_price * (1.0 - sl_mult),
            entry_price * (1.0 - sl_limit_mult),
        ),
        OrderSide::Sell => (
            entry_price * (1.0 - tp_mult),
            entry_price * (1.0 + sl_mult),
            entry_price * (1.0 + sl_limit_mult),
        ),
    }
}

/// Take-profit and stop-loss targets for an options position, as absolute
/// premium prices.
///
/// The side refers to the underlying signal direction (calls vs puts); the
/// position itself is always long premium, so the TP sits above the
/// premium and the SL below it regardless of side.
pub fn options_exit_prices(premium: f64, _side: OrderSide, config: &StrategyConfig) -> (f64, f64) {
    let tp_mult = config.options_tp_pct / 100.0;
    let sl_mult = config.options_sl_pct / 100.0;
    (premium * (1.0 + tp_mult), premium * (1.0 - sl_mult))
}
