//! TradeLens Core: domain types, return calculator, ledger ingestion.
//!
//! This crate contains everything that touches a single trade:
//! - Domain types (side, trade record, enriched trade)
//! - The return calculator and its `DataError` failure modes
//! - CSV ingestion with mandatory-column validation and per-row rejection

pub mod domain;
pub mod error;
pub mod ingest;

pub use domain::{compute_return, EnrichedTrade, Side, TradeRecord};
pub use error::{DataError, RejectedRecord, ValidationError};
pub use ingest::{read_ledger, read_ledger_from_reader, ColumnConfig, IngestError, LedgerBatch};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: domain types can cross threads, so independent
    /// batches can be analysed concurrently by a host.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Side>();
        require_sync::<Side>();
        require_send::<TradeRecord>();
        require_sync::<TradeRecord>();
        require_send::<EnrichedTrade>();
        require_sync::<EnrichedTrade>();
        require_send::<LedgerBatch>();
        require_sync::<LedgerBatch>();
        require_send::<RejectedRecord>();
        require_sync::<RejectedRecord>();
        require_send::<ColumnConfig>();
        require_sync::<ColumnConfig>();
    }
}
