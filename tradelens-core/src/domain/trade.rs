//! TradeRecord: one closed trade from the ledger, and its enriched form.

use super::side::Side;
use crate::error::DataError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A closed trade exactly as it was read from the ledger.
///
/// `assigned_probability` is stored unclamped; consumers that bin on it use
/// [`TradeRecord::clamped_probability`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub id: String,
    pub instrument: String,
    pub side: Side,

    // ── Entry / exit ──
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,

    // ── Forecast ──
    pub assigned_probability: f64,

    // ── Optional columns ──
    /// Position size. `None` when the column is absent or the cell is not numeric.
    pub size: Option<f64>,
    pub estimated_slippage_pct: Option<f64>,
    pub actual_slippage_pct: Option<f64>,
    /// Process-control flags, positionally aligned with the batch's control names.
    /// `None` marks a missing or non-boolean cell.
    pub controls: Vec<Option<bool>>,
}

impl TradeRecord {
    /// Probability clamped to [0, 1] for binning.
    pub fn clamped_probability(&self) -> f64 {
        self.assigned_probability.clamp(0.0, 1.0)
    }

    /// Size used to weight the return on the equity curve. Defaults to 1.
    pub fn weight(&self) -> f64 {
        match self.size {
            Some(size) if size.is_finite() => size,
            _ => 1.0,
        }
    }

    /// `actual - estimated` slippage, when both sides are present.
    pub fn slippage_gap(&self) -> Option<f64> {
        match (self.estimated_slippage_pct, self.actual_slippage_pct) {
            (Some(estimated), Some(actual)) => Some(actual - estimated),
            _ => None,
        }
    }

    pub fn realized_return(&self) -> Result<f64, DataError> {
        compute_return(self.side, self.entry_price, self.exit_price)
    }
}

/// Realized return of a trade as a signed fraction of the entry price.
///
/// Long: `(exit - entry) / entry`. Short: `(entry - exit) / entry`.
pub fn compute_return(side: Side, entry_price: f64, exit_price: f64) -> Result<f64, DataError> {
    if !entry_price.is_finite() {
        return Err(DataError::NonFinite {
            field: "entry_price".into(),
        });
    }
    if !exit_price.is_finite() {
        return Err(DataError::NonFinite {
            field: "exit_price".into(),
        });
    }
    if entry_price == 0.0 {
        return Err(DataError::ZeroEntryPrice);
    }
    if entry_price < 0.0 {
        return Err(DataError::NonPositivePrice {
            field: "entry_price".into(),
            value: entry_price,
        });
    }
    if exit_price <= 0.0 {
        return Err(DataError::NonPositivePrice {
            field: "exit_price".into(),
            value: exit_price,
        });
    }

    let ret = match side {
        Side::Long => (exit_price - entry_price) / entry_price,
        Side::Short => (entry_price - exit_price) / entry_price,
    };
    // A subnormal entry price overflows the division.
    if !ret.is_finite() {
        return Err(DataError::NonFinite {
            field: "realized_return".into(),
        });
    }
    Ok(ret)
}

/// A trade with its derived return and win flag.
///
/// The derived pair is computed once in [`EnrichedTrade::new`] and only
/// exposed through getters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedTrade {
    #[serde(flatten)]
    record: TradeRecord,
    realized_return: f64,
    is_win: bool,
}

impl EnrichedTrade {
    pub fn new(record: TradeRecord) -> Result<Self, DataError> {
        let realized_return = record.realized_return()?;
        if !(realized_return * record.weight()).is_finite() {
            return Err(DataError::NonFinite {
                field: "size".into(),
            });
        }
        Ok(Self {
            record,
            realized_return,
            is_win: realized_return > 0.0,
        })
    }

    pub fn record(&self) -> &TradeRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn realized_return(&self) -> f64 {
        self.realized_return
    }

    /// True only for a strictly positive return; a flat trade is a loss.
    pub fn is_win(&self) -> bool {
        self.is_win
    }

    /// Outcome as 0/1, the target of the Brier score.
    pub fn outcome(&self) -> f64 {
        if self.is_win {
            1.0
        } else {
            0.0
        }
    }

    /// Return multiplied by the trade's size.
    pub fn weighted_return(&self) -> f64 {
        self.realized_return * self.record.weight()
    }
}
