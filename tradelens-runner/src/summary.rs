//! Performance summary: pure functions over the enriched trade set.
//!
//! Every statistic that can be undefined (no wins, no losses, too few trades)
//! is an `Option`, never a NaN.

use serde::{Deserialize, Serialize};
use tradelens_core::EnrichedTrade;

use crate::calibration::CalibrationReport;
use crate::equity::EquityCurve;

/// Scalar aggregates for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub trade_count: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub win_rate: f64,
    /// Mean of strictly positive returns.
    pub mean_gain: Option<f64>,
    /// Mean of non-positive returns.
    pub mean_loss: Option<f64>,
    pub expectancy: Option<f64>,
    pub mean_return: f64,
    pub return_std_dev: Option<f64>,
    /// Per-trade Sharpe-style ratio: mean return / sample std, not annualized.
    pub sharpe_ratio: Option<f64>,
    pub brier_score: f64,
    /// Final value of the size-weighted equity curve.
    pub total_return: f64,
    /// Most negative defined drawdown point.
    pub max_drawdown: Option<f64>,
}

impl PerformanceSummary {
    /// Summarize a non-empty trade set.
    ///
    /// Returns `None` for an empty set; the pipeline turns that into
    /// `AnalysisError::EmptyBatch`.
    pub fn compute(
        trades: &[EnrichedTrade],
        calibration: &CalibrationReport,
        equity: &EquityCurve,
    ) -> Option<Self> {
        if trades.is_empty() {
            return None;
        }
        let returns: Vec<f64> = trades.iter().map(|t| t.realized_return()).collect();
        let gains: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
        let losses: Vec<f64> = returns.iter().copied().filter(|r| *r <= 0.0).collect();

        let rate = win_rate(trades)?;
        let mean_gain = mean(&gains);
        let mean_loss = mean(&losses);

        Some(Self {
            trade_count: trades.len(),
            win_count: gains.len(),
            loss_count: losses.len(),
            win_rate: rate,
            mean_gain,
            mean_loss,
            expectancy: expectancy(rate, mean_gain, mean_loss),
            mean_return: mean(&returns)?,
            return_std_dev: sample_std_dev(&returns),
            sharpe_ratio: sharpe_ratio(&returns),
            brier_score: calibration.brier_score?,
            total_return: equity.final_value()?,
            max_drawdown: equity.max_drawdown(),
        })
    }
}

// ─── Individual statistics ──────────────────────────────────────────

/// Fraction of trades with a strictly positive return.
pub fn win_rate(trades: &[EnrichedTrade]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let wins = trades.iter().filter(|t| t.is_win()).count();
    Some(wins as f64 / trades.len() as f64)
}

/// `win_rate * mean_gain + (1 - win_rate) * mean_loss`.
///
/// A missing mean contributes nothing when its outcome has zero weight
/// (no wins means `win_rate == 0`). A missing mean with non-zero weight makes
/// the expectancy undefined.
pub fn expectancy(win_rate: f64, mean_gain: Option<f64>, mean_loss: Option<f64>) -> Option<f64> {
    let loss_rate = 1.0 - win_rate;
    let gain_term = match mean_gain {
        Some(gain) => win_rate * gain,
        None if win_rate == 0.0 => 0.0,
        None => return None,
    };
    let loss_term = match mean_loss {
        Some(loss) => loss_rate * loss,
        None if loss_rate == 0.0 => 0.0,
        None => return None,
    };
    Some(gain_term + loss_term)
}

/// Mean / sample standard deviation of per-trade returns.
///
/// `None` with fewer than 2 trades or no dispersion.
pub fn sharpe_ratio(returns: &[f64]) -> Option<f64> {
    let mean = mean(returns)?;
    let std = sample_std_dev(returns)?;
    if std < 1e-15 {
        return None;
    }
    Some(mean / std)
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub(crate) fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}
