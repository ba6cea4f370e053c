//! Probability calibration: fixed bins over [0, 1] and the Brier score.
//!
//! Each trade is placed in one of [`BIN_COUNT`] equal-width buckets by its
//! clamped assigned probability. Bins are half-open `[lo, hi)` except the last,
//! which also holds 1.0. The Brier score uses the raw, unclamped probability.

use serde::{Deserialize, Serialize};
use tradelens_core::EnrichedTrade;

use crate::summary::mean;

/// Number of calibration buckets. Always reported in full.
pub const BIN_COUNT: usize = 5;

/// Index of the bucket centered on 50%.
pub const MIDDLE_BIN: usize = BIN_COUNT / 2;

/// One probability bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBin {
    pub lower: f64,
    pub upper: f64,
    pub center: f64,
    pub count: usize,
    /// Realized win frequency; `None` when the bucket is empty.
    pub frequency: Option<f64>,
}

/// Calibration curve plus aggregate score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub bins: Vec<CalibrationBin>,
    /// Mean squared error between assigned probability and outcome.
    /// `None` only for an empty trade set.
    pub brier_score: Option<f64>,
}

impl CalibrationReport {
    pub fn centers(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.center).collect()
    }

    pub fn frequencies(&self) -> Vec<Option<f64>> {
        self.bins.iter().map(|b| b.frequency).collect()
    }

    /// The bucket centered on 50%; `None` only for a malformed report.
    pub fn middle_bin(&self) -> Option<&CalibrationBin> {
        self.bins.get(MIDDLE_BIN)
    }
}

/// Lower edge of bucket `k` (and upper edge of bucket `k - 1`).
fn edge(k: usize) -> f64 {
    k as f64 / BIN_COUNT as f64
}

/// Bucket for a probability. Out-of-range values are clamped first.
pub fn bin_index(probability: f64) -> usize {
    let p = probability.clamp(0.0, 1.0);
    (1..BIN_COUNT)
        .find(|&k| p < edge(k))
        .map(|k| k - 1)
        .unwrap_or(BIN_COUNT - 1)
}

/// Build the calibration curve and Brier score for a set of trades.
pub fn calibrate(trades: &[EnrichedTrade]) -> CalibrationReport {
    let mut outcomes: Vec<Vec<f64>> = vec![Vec::new(); BIN_COUNT];
    for trade in trades {
        outcomes[bin_index(trade.record().clamped_probability())].push(trade.outcome());
    }

    let bins = outcomes
        .iter()
        .enumerate()
        .map(|(k, values)| CalibrationBin {
            lower: edge(k),
            upper: edge(k + 1),
            center: (edge(k) + edge(k + 1)) / 2.0,
            count: values.len(),
            frequency: mean(values),
        })
        .collect();

    CalibrationReport {
        bins,
        brier_score: brier_score(trades),
    }
}

/// Mean of `(assigned_probability - outcome)^2` over all trades, using the
/// unclamped probability.
pub fn brier_score(trades: &[EnrichedTrade]) -> Option<f64> {
    let errors: Vec<f64> = trades
        .iter()
        .map(|t| (t.record().assigned_probability - t.outcome()).powi(2))
        .collect();
    mean(&errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::outcome;

    #[test]
    fn bin_edges_are_half_open() {
        assert_eq!(bin_index(0.0), 0);
        assert_eq!(bin_index(0.19999), 0);
        assert_eq!(bin_index(0.2), 1);
        assert_eq!(bin_index(0.5), 2);
        assert_eq!(bin_index(0.6), 3);
        assert_eq!(bin_index(0.8), 4);
        assert_eq!(bin_index(1.0), 4);
    }

    #[test]
    fn out_of_range_probabilities_are_clamped() {
        assert_eq!(bin_index(-0.3), 0);
        assert_eq!(bin_index(1.7), 4);
    }

    #[test]
    fn always_five_bins() {
        let report = calibrate(&[]);
        assert_eq!(report.bins.len(), BIN_COUNT);
        assert!(report.frequencies().iter().all(Option::is_none));
        assert_eq!(report.brier_score, None);
    }

    #[test]
    fn centers() {
        let report = calibrate(&[]);
        let centers = report.centers();
        let expected = [0.1, 0.3, 0.5, 0.7, 0.9];
        for (c, e) in centers.iter().zip(expected) {
            assert!((c - e).abs() < 1e-12, "center {c} vs {e}");
        }
    }

    #[test]
    fn half_wins_at_fifty_percent() {
        let trades: Vec<_> = (0..10)
            .map(|i| outcome(&format!("T{i}"), i % 2 == 0, 0.5))
            .collect();
        let report = calibrate(&trades);

        let middle = report.middle_bin().unwrap();
        assert_eq!(middle.count, 10);
        assert_eq!(middle.frequency, Some(0.5));
        assert_eq!(report.bins[0].frequency, None);
        // Every squared error is 0.25.
        assert!((report.brier_score.unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn brier_uses_raw_probability() {
        // Probability 1.5 clamps into the last bin but the score sees 1.5.
        let trades = vec![outcome("A", true, 1.5)];
        let report = calibrate(&trades);
        assert_eq!(report.bins[4].count, 1);
        assert!((report.brier_score.unwrap() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn frequency_per_bin() {
        let trades = vec![
            outcome("A", true, 0.85),
            outcome("B", true, 0.95),
            outcome("C", false, 0.9),
            outcome("D", false, 0.1),
        ];
        let report = calibrate(&trades);
        let f = report.bins[4].frequency.unwrap();
        assert!((f - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.bins[0].frequency, Some(0.0));
    }
}
