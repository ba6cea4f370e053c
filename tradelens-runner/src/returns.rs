//! Return stage: turns accepted ledger records into enriched trades.

use tracing::warn;
use tradelens_core::{EnrichedTrade, RejectedRecord, TradeRecord};

/// Output of the return stage.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    /// Trades with their derived return, in input order.
    pub trades: Vec<EnrichedTrade>,
    /// Records the return calculator refused (e.g. zero entry price).
    pub rejected: Vec<RejectedRecord>,
}

/// Compute `realized_return` / `is_win` once per record.
///
/// A record the calculator cannot handle is dropped from the analysis and
/// reported; it never aborts the batch.
pub fn enrich(records: &[TradeRecord]) -> Enrichment {
    let mut out = Enrichment::default();
    for record in records {
        match EnrichedTrade::new(record.clone()) {
            Ok(trade) => out.trades.push(trade),
            Err(reason) => {
                warn!(id = %record.id, %reason, "trade rejected by return calculator");
                out.rejected.push(RejectedRecord {
                    line: None,
                    id: Some(record.id.clone()),
                    reason,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::trade;
    use tradelens_core::{DataError, Side};

    #[test]
    fn zero_entry_price_is_reported_not_fatal() {
        let mut bad = trade("B", Side::Long, 100.0, 110.0, 0.5);
        bad.entry_price = 0.0;
        let records = vec![
            trade("A", Side::Long, 100.0, 110.0, 0.5),
            bad,
            trade("C", Side::Short, 100.0, 90.0, 0.5),
        ];

        let out = enrich(&records);

        assert_eq!(out.trades.len(), 2);
        assert_eq!(out.trades[0].id(), "A");
        assert_eq!(out.trades[1].id(), "C");
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].id.as_deref(), Some("B"));
        assert_eq!(out.rejected[0].reason, DataError::ZeroEntryPrice);
        assert_eq!(out.rejected[0].line, None);
    }

    #[test]
    fn win_flag_matches_return_sign() {
        let records = vec![
            trade("A", Side::Long, 100.0, 110.0, 0.5),
            trade("B", Side::Long, 100.0, 100.0, 0.5),
            trade("C", Side::Short, 100.0, 101.0, 0.5),
        ];
        let out = enrich(&records);
        let wins: Vec<bool> = out.trades.iter().map(|t| t.is_win()).collect();
        assert_eq!(wins, vec![true, false, false]);
    }
}
