//! Domain types for a trade ledger.

pub mod side;
pub mod trade;

pub use side::{Side, UnknownSide};
pub use trade::{compute_return, EnrichedTrade, TradeRecord};
