//! Process adherence: compliance rate per boolean control column.

use serde::{Deserialize, Serialize};
use tradelens_core::EnrichedTrade;

/// Compliance for one control column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceEntry {
    pub control: String,
    /// Fraction of `true` among boolean cells; `None` if the column holds no
    /// boolean values at all.
    pub compliance: Option<f64>,
    /// Number of trades with a boolean value in this column.
    pub observed: usize,
}

/// Compute compliance for each present control, in the order given.
///
/// `controls` is the batch's resolved control list; each trade's `controls`
/// vector is aligned with it. Missing or non-boolean cells are excluded from
/// the mean rather than counted as failures.
pub fn adherence(controls: &[String], trades: &[EnrichedTrade]) -> Vec<AdherenceEntry> {
    controls
        .iter()
        .enumerate()
        .map(|(idx, control)| {
            let values: Vec<bool> = trades
                .iter()
                .filter_map(|t| t.record().controls.get(idx).copied().flatten())
                .collect();
            let compliance = if values.is_empty() {
                None
            } else {
                let followed = values.iter().filter(|v| **v).count();
                Some(followed as f64 / values.len() as f64)
            };
            AdherenceEntry {
                control: control.clone(),
                compliance,
                observed: values.len(),
            }
        })
        .collect()
}
