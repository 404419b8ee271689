//! Performance metrics — pure functions over a completed run.
//!
//! Everything here operates on the trade list and equity curve of a
//! [`RunResult`]; nothing touches the broker or engine. Ratios follow the
//! 252-trading-days-per-year convention. Percentages are in percent units
//! (25.0 = 25%).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::result::{EquityPoint, RunResult};
use backcast_core::domain::Trade;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Maximum drawdown details: the single worst peak-to-trough percentage
/// decline, with its dollar size and the peak/trough samples it spans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownInfo {
    pub max_drawdown_pct: f64,
    pub max_drawdown_dollar: f64,
    pub peak_equity: f64,
    pub trough_equity: f64,
    pub peak_timestamp: Option<DateTime<Utc>>,
    pub trough_timestamp: Option<DateTime<Utc>>,
}

/// Per-strategy performance summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetrics {
    pub strategy: String,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
}

/// Complete performance metrics for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    // Capital
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,

    // Risk-adjusted
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,

    // Drawdown
    pub drawdown: DrawdownInfo,

    // Trade statistics
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub expectancy: f64,

    // P&L
    pub total_pnl: f64,
    pub avg_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,

    // Exposure
    pub total_bars: usize,
    pub bars_in_market: usize,
    pub exposure_pct: f64,

    // Per-strategy
    pub by_strategy: BTreeMap<String, StrategyMetrics>,
}

// ─── Individual metric functions ────────────────────────────────────

/// Pairwise percentage returns between consecutive equity samples.
/// A non-positive prior sample contributes a zero return.
pub fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    equity_curve
        .windows(2)
        .map(|w| {
            if w[0].equity > 0.0 {
                (w[1].equity - w[0].equity) / w[0].equity
            } else {
                0.0
            }
        })
        .collect()
}

/// Annualized Sharpe ratio: mean / sample std (n-1 denominator) * sqrt(252).
/// Returns 0.0 below 2 samples or when the deviation is zero.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(returns);
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    let std = variance.sqrt();
    if std == 0.0 {
        return 0.0;
    }
    (mean / std) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio. The downside deviation squares only negative
/// returns but averages over all n samples, so a single bad day in a long
/// run is penalized proportionally.
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(returns);
    let downside_var = returns
        .iter()
        .map(|r| r.min(0.0).powi(2))
        .sum::<f64>()
        / returns.len() as f64;
    let downside_std = downside_var.sqrt();
    if downside_std == 0.0 {
        return 0.0;
    }
    (mean / downside_std) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Single forward pass over the equity curve, tracking the running peak and
/// recording the worst percentage decline seen so far. The dollar figure is
/// the one belonging to that worst percentage event, not an independently
/// maximized dollar decline.
pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> DrawdownInfo {
    let Some(first) = equity_curve.first() else {
        return DrawdownInfo::default();
    };

    let mut peak = first.equity;
    let mut peak_ts = first.timestamp;
    let mut info = DrawdownInfo {
        peak_equity: peak,
        trough_equity: peak,
        peak_timestamp: Some(peak_ts),
        trough_timestamp: Some(peak_ts),
        ..DrawdownInfo::default()
    };

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
            peak_ts = point.timestamp;
        }
        let dd_dollar = peak - point.equity;
        let dd_pct = if peak > 0.0 {
            dd_dollar / peak * 100.0
        } else {
            0.0
        };
        if dd_pct > info.max_drawdown_pct {
            info.max_drawdown_pct = dd_pct;
            info.max_drawdown_dollar = dd_dollar;
            info.peak_equity = peak;
            info.trough_equity = point.equity;
            info.peak_timestamp = Some(peak_ts);
            info.trough_timestamp = Some(point.timestamp);
        }
    }
    info
}

/// Gross profit / gross loss. +Inf with wins and no losses; 0 with neither.
fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// The same trade statistics, grouped by the strategy stored on each trade.
pub fn strategy_breakdown(trades: &[Trade]) -> BTreeMap<String, StrategyMetrics> {
    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for trade in trades {
        buckets
            .entry(trade.strategy.clone())
            .or_default()
            .push(trade.pnl());
    }

    buckets
        .into_iter()
        .map(|(strategy, pnls)| {
            let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
            let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p < 0.0).collect();
            let gross_profit: f64 = wins.iter().sum();
            let gross_loss: f64 = losses.iter().sum::<f64>().abs();

            let metrics = StrategyMetrics {
                strategy: strategy.clone(),
                total_trades: pnls.len(),
                winning_trades: wins.len(),
                losing_trades: losses.len(),
                win_rate: wins.len() as f64 / pnls.len() as f64 * 100.0,
                total_pnl: pnls.iter().sum(),
                avg_pnl: pnls.iter().sum::<f64>() / pnls.len() as f64,
                avg_win: if wins.is_empty() {
                    0.0
                } else {
                    gross_profit / wins.len() as f64
                },
                avg_loss: if losses.is_empty() {
                    0.0
                } else {
                    -gross_loss / losses.len() as f64
                },
                profit_factor: profit_factor(gross_profit, gross_loss),
            };
            (strategy, metrics)
        })
        .collect()
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

// ─── Main entry point ───────────────────────────────────────────────

/// Compute all performance metrics from a completed run.
pub fn compute_metrics(result: &RunResult) -> PerformanceMetrics {
    let equity_curve = &result.equity_curve;
    let trades = &result.trades;
    let initial = result.config.initial_capital;
    let final_equity = result.final_equity();

    let total_return_pct = if initial > 0.0 {
        (final_equity - initial) / initial * 100.0
    } else {
        0.0
    };

    let n_bars = equity_curve.len();
    let years = n_bars as f64 / TRADING_DAYS_PER_YEAR;
    let annualized_return_pct = if years > 0.0 && final_equity > 0.0 && initial > 0.0 {
        ((final_equity / initial).powf(1.0 / years) - 1.0) * 100.0
    } else {
        0.0
    };

    let returns = daily_returns(equity_curve);
    let sharpe = sharpe_ratio(&returns);
    let sortino = sortino_ratio(&returns);

    let drawdown = compute_drawdown(equity_curve);
    let calmar_ratio = if drawdown.max_drawdown_pct > 0.0 {
        annualized_return_pct / drawdown.max_drawdown_pct
    } else {
        0.0
    };

    let pnls: Vec<f64> = trades.iter().map(Trade::pnl).collect();
    let wins: Vec<f64> = pnls.iter().copied().filter(|p| *p > 0.0).collect();
    let losses: Vec<f64> = pnls.iter().copied().filter(|p| *p < 0.0).collect();
    let breakevens = pnls.iter().filter(|p| **p == 0.0).count();

    let gross_profit: f64 = wins.iter().sum();
    let gross_loss: f64 = losses.iter().sum::<f64>().abs();

    let total_trades = trades.len();
    let win_rate = if total_trades > 0 {
        wins.len() as f64 / total_trades as f64 * 100.0
    } else {
        0.0
    };
    let avg_pnl = if total_trades > 0 {
        pnls.iter().sum::<f64>() / total_trades as f64
    } else {
        0.0
    };
    let avg_win = if wins.is_empty() {
        0.0
    } else {
        gross_profit / wins.len() as f64
    };
    let avg_loss = if losses.is_empty() {
        0.0
    } else {
        -gross_loss / losses.len() as f64
    };

    let bars_in_market = equity_curve.iter().filter(|p| p.open_positions > 0).count();
    let exposure_pct = if n_bars > 0 {
        bars_in_market as f64 / n_bars as f64 * 100.0
    } else {
        0.0
    };

    PerformanceMetrics {
        initial_capital: initial,
        final_equity,
        total_return_pct,
        annualized_return_pct,
        sharpe_ratio: sharpe,
        sortino_ratio: sortino,
        calmar_ratio,
        drawdown,
        total_trades,
        winning_trades: wins.len(),
        losing_trades: losses.len(),
        breakeven_trades: breakevens,
        win_rate,
        profit_factor: profit_factor(gross_profit, gross_loss),
        expectancy: avg_pnl,
        total_pnl: pnls.iter().sum(),
        avg_pnl,
        avg_win,
        avg_loss,
        largest_win: wins.iter().copied().fold(0.0, f64::max),
        largest_loss: losses.iter().copied().fold(0.0, f64::min),
        total_bars: n_bars,
        bars_in_market,
        exposure_pct,
        by_strategy: strategy_breakdown(trades),
    }
}
