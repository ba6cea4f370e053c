//! Slippage deviation: actual minus estimated, per trade.

use serde::{Deserialize, Serialize};
use tradelens_core::EnrichedTrade;

use crate::summary::mean;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlippagePoint {
    pub trade_id: String,
    /// `actual_slippage_pct - estimated_slippage_pct`; positive means execution
    /// cost more than planned.
    pub deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlippageReport {
    /// Qualifying trades only, in input order.
    pub points: Vec<SlippagePoint>,
    pub mean_deviation: Option<f64>,
}

impl SlippageReport {
    pub fn deviations(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.deviation).collect()
    }
}

/// Trades missing either slippage value are skipped, not imputed.
pub fn slippage_deviation(trades: &[EnrichedTrade]) -> SlippageReport {
    let points: Vec<SlippagePoint> = trades
        .iter()
        .filter_map(|t| {
            t.record().slippage_gap().map(|deviation| SlippagePoint {
                trade_id: t.id().to_string(),
                deviation,
            })
        })
        .collect();
    let mean_deviation = mean(&points.iter().map(|p| p.deviation).collect::<Vec<_>>());
    SlippageReport {
        points,
        mean_deviation,
    }
}
