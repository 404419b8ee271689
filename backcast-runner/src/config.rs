//! Serializable run configuration.
//!
//! A [`RunConfig`] captures everything needed to reproduce a run: the
//! backtest settings plus the strategy table. Loaded from TOML, e.g.:
//!
//! ```toml
//! [backtest]
//! initial_capital = 50000.0
//! slippage_pct = 0.05
//! max_open_positions = 3
//!
//! [[strategies]]
//! name = "bollinger_mean_reversion"
//! stock_tp_pct = 0.2
//! stock_sl_pct = 0.1
//! stock_stop_limit_pct = 0.15
//! options_tp_pct = 20.0
//! options_sl_pct = 10.0
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use backcast_core::config::BacktestConfig;
use backcast_core::strategy::{StrategyBook, StrategyConfig};

use crate::engine::Engine;

/// Backtest settings plus the strategy table, as one loadable document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
}

impl RunConfig {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        toml::from_str(raw).context("failed to parse run config")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// The strategy table as a resolvable registry.
    pub fn strategy_book(&self) -> StrategyBook {
        StrategyBook::from_configs(self.strategies.iter().cloned())
    }

    /// Build an engine from these settings.
    pub fn into_engine(self) -> Engine {
        let book = self.strategy_book();
        Engine::new(self.backtest, book)
    }
}
