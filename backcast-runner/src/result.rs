//! Run results: the equity curve and everything a replay produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use backcast_core::config::BacktestConfig;
use backcast_core::domain::{Position, Trade};

/// One equity-curve sample, taken after fills and signal dispatch on each
/// bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub cash: f64,
    pub open_positions: usize,
}

/// Output of a completed replay.
///
/// Consumed by [`crate::metrics::compute_metrics`] and by out-of-scope
/// reporting layers; the core owns no wire or on-disk format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub config: BacktestConfig,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Positions still open when the replay window ended.
    pub open_positions: Vec<Position>,
    pub signals_processed: usize,
    pub signals_skipped: usize,
    pub bars_processed: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl RunResult {
    /// Content fingerprint of the run's observable output (trades and
    /// equity curve). Two replays of identical input streams must produce
    /// identical fingerprints — a cheap way to assert determinism.
    pub fn fingerprint(&self) -> String {
        let payload = serde_json::json!({
            "trades": &self.trades,
            "equity_curve": &self.equity_curve,
        });
        blake3::hash(payload.to_string().as_bytes())
            .to_hex()
            .to_string()
    }

    /// Final equity, falling back to initial capital on an empty curve.
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.config.initial_capital)
    }
}
