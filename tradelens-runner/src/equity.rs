//! Equity curve and drawdown, ordered by exit time.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tradelens_core::EnrichedTrade;

/// Cumulative size-weighted return after a trade closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub exit_time: NaiveDateTime,
    pub trade_id: String,
    pub equity: f64,
}

/// Fractional retracement from the running peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    pub exit_time: NaiveDateTime,
    pub trade_id: String,
    /// `<= 0` when defined; `None` while the running peak is not positive.
    pub drawdown: Option<f64>,
}

/// Two positionally aligned series, one point per trade.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EquityCurve {
    pub equity: Vec<EquityPoint>,
    pub drawdown: Vec<DrawdownPoint>,
}

impl EquityCurve {
    pub fn len(&self) -> usize {
        self.equity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equity.is_empty()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.equity.last().map(|p| p.equity)
    }

    /// Deepest defined drawdown (most negative).
    pub fn max_drawdown(&self) -> Option<f64> {
        self.drawdown
            .iter()
            .filter_map(|p| p.drawdown)
            .fold(None, |worst: Option<f64>, dd| {
                Some(worst.map_or(dd, |w| w.min(dd)))
            })
    }
}

/// Build the equity and drawdown series.
///
/// Trades are ordered by `exit_time` with a stable sort, so trades closing at
/// the same instant keep their input order. Drawdown at each point is
/// `(equity - peak) / peak` against the running peak including that point; it
/// is undefined unless the peak is strictly positive.
pub fn build_equity_curve(trades: &[EnrichedTrade]) -> EquityCurve {
    let mut order: Vec<&EnrichedTrade> = trades.iter().collect();
    order.sort_by_key(|t| t.record().exit_time);

    let mut curve = EquityCurve {
        equity: Vec::with_capacity(order.len()),
        drawdown: Vec::with_capacity(order.len()),
    };
    let mut cumulative = 0.0_f64;
    let mut peak = f64::NEG_INFINITY;

    for trade in order {
        cumulative += trade.weighted_return();
        if cumulative > peak {
            peak = cumulative;
        }
        let drawdown = if peak > 0.0 {
            Some((cumulative - peak) / peak)
        } else {
            None
        };

        let exit_time = trade.record().exit_time;
        curve.equity.push(EquityPoint {
            exit_time,
            trade_id: trade.id().to_string(),
            equity: cumulative,
        });
        curve.drawdown.push(DrawdownPoint {
            exit_time,
            trade_id: trade.id().to_string(),
            drawdown,
        });
    }
    curve
}
