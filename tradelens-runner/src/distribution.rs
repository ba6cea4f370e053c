//! Return distribution: equal-width histogram plus normal-fit parameters.

use serde::{Deserialize, Serialize};

use crate::summary::{mean, sample_std_dev};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReturnDistribution {
    pub bins: Vec<HistogramBin>,
    /// Mean of the fitted normal.
    pub mean: Option<f64>,
    /// Sample standard deviation of the fitted normal.
    pub std_dev: Option<f64>,
}

/// Histogram of `returns` over `[min, max]` with `bin_count` bins (at least 1).
///
/// The last bin is closed. When every return is equal a single degenerate bin
/// holds them all.
pub fn return_distribution(returns: &[f64], bin_count: usize) -> ReturnDistribution {
    let mut dist = ReturnDistribution {
        bins: Vec::new(),
        mean: mean(returns),
        std_dev: sample_std_dev(returns),
    };
    if returns.is_empty() {
        return dist;
    }

    let min = returns.iter().copied().fold(f64::INFINITY, f64::min);
    let max = returns.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max - min < 1e-15 {
        dist.bins.push(HistogramBin {
            lower: min,
            upper: max,
            count: returns.len(),
        });
        return dist;
    }

    let n = bin_count.max(1);
    let width = (max - min) / n as f64;
    let mut counts = vec![0usize; n];
    for r in returns {
        let idx = (((r - min) / width).floor() as usize).min(n - 1);
        counts[idx] += 1;
    }

    dist.bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == n {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count,
        })
        .collect();
    dist
}
