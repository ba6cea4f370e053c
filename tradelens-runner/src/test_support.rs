//! Shared fixtures for unit tests.

use chrono::{NaiveDate, NaiveDateTime};
use tradelens_core::{EnrichedTrade, Side, TradeRecord};

pub(crate) fn at_day(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap()
}

pub(crate) fn trade(id: &str, side: Side, entry: f64, exit: f64, probability: f64) -> TradeRecord {
    TradeRecord {
        id: id.into(),
        instrument: "SPY".into(),
        side,
        entry_time: at_day(1),
        entry_price: entry,
        exit_time: at_day(2),
        exit_price: exit,
        assigned_probability: probability,
        size: None,
        estimated_slippage_pct: None,
        actual_slippage_pct: None,
        controls: Vec::new(),
    }
}

/// Long trade from 100 whose return is `ret` (up to float rounding).
pub(crate) fn with_return(id: &str, ret: f64, probability: f64) -> EnrichedTrade {
    EnrichedTrade::new(trade(id, Side::Long, 100.0, 100.0 * (1.0 + ret), probability)).unwrap()
}

/// Trade that wins or loses 1% at the given probability.
pub(crate) fn outcome(id: &str, win: bool, probability: f64) -> EnrichedTrade {
    with_return(id, if win { 0.01 } else { -0.01 }, probability)
}
