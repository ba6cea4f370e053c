//! Error types shared by ingestion and the return calculator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The ledger is missing mandatory columns. Fatal for the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing mandatory columns: {}", .missing.join(", "))]
pub struct ValidationError {
    /// Every missing column, in mandatory-column order.
    pub missing: Vec<String>,
}

/// A single record could not be turned into a trade.
///
/// Records failing with a `DataError` are rejected individually; the rest of
/// the batch is still analysed.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataError {
    #[error("entry price is zero")]
    ZeroEntryPrice,

    #[error("'{field}' must be positive, got {value}")]
    NonPositivePrice { field: String, value: f64 },

    #[error("'{field}' is not a finite number")]
    NonFinite { field: String },

    #[error("'{field}' is empty")]
    MissingValue { field: String },

    #[error("cannot parse '{raw}' as a number in '{field}'")]
    InvalidNumber { field: String, raw: String },

    #[error("cannot parse '{raw}' as a timestamp in '{field}'")]
    InvalidTimestamp { field: String, raw: String },

    #[error("unrecognized side '{raw}' (expected long/largo or short/corto)")]
    UnknownSide { raw: String },

    #[error("duplicate trade id '{id}'")]
    DuplicateId { id: String },

    #[error("'{field}' is not valid UTF-8")]
    InvalidEncoding { field: String },
}

/// A rejected record together with where it came from and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// 1-based line in the source file (header is line 1). `None` for
    /// records rejected after ingestion.
    pub line: Option<u64>,
    /// Trade id, when the id cell was readable.
    pub id: Option<String>,
    pub reason: DataError,
}

impl std::fmt::Display for RejectedRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, &self.id) {
            (Some(line), Some(id)) => write!(f, "line {line} (id {id}): {}", self.reason),
            (Some(line), None) => write!(f, "line {line}: {}", self.reason),
            (None, Some(id)) => write!(f, "id {id}: {}", self.reason),
            (None, None) => write!(f, "{}", self.reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_column() {
        let err = ValidationError {
            missing: vec!["lado".into(), "precio_salida".into()],
        };
        assert_eq!(
            err.to_string(),
            "missing mandatory columns: lado, precio_salida"
        );
    }

    #[test]
    fn data_error_serializes_with_kind_tag() {
        let json = serde_json::to_string(&DataError::ZeroEntryPrice).unwrap();
        assert_eq!(json, r#"{"kind":"zero_entry_price"}"#);

        let err = DataError::DuplicateId { id: "T1".into() };
        let back: DataError = serde_json::from_str(&serde_json::to_string(&err).unwrap()).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn rejected_record_display() {
        let rec = RejectedRecord {
            line: Some(4),
            id: Some("T3".into()),
            reason: DataError::ZeroEntryPrice,
        };
        assert_eq!(rec.to_string(), "line 4 (id T3): entry price is zero");

        let rec = RejectedRecord {
            line: None,
            ..rec
        };
        assert_eq!(rec.to_string(), "id T3: entry price is zero");
    }
}
