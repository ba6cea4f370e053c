//! Ledger ingestion: CSV in, validated [`LedgerBatch`] out.
//!
//! Policy:
//! 1. Missing mandatory columns → [`IngestError::Validation`], nothing is read.
//! 2. A row with an unusable mandatory cell, or with bytes that are not
//!    UTF-8 → recorded as a [`RejectedRecord`] and skipped; the rest of the
//!    batch is kept.
//! 3. Optional cells that are empty or malformed are treated as absent.

pub mod columns;
pub mod parse;

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Side, TradeRecord};
use crate::error::{DataError, RejectedRecord, ValidationError};

pub use columns::{ColumnConfig, ResolvedColumns, MANDATORY_COLUMNS};

/// Errors that refuse a whole ledger.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to open ledger '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// A validated batch of trades ready for analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerBatch {
    /// Accepted trades, in file order.
    pub trades: Vec<TradeRecord>,
    /// Control columns present in the file, in declaration order.
    /// Every trade's `controls` vector is aligned with this list.
    pub controls: Vec<String>,
    pub has_size: bool,
    pub has_slippage: bool,
    /// Rows skipped during ingestion, with reasons.
    pub rejected: Vec<RejectedRecord>,
    /// BLAKE3 over every data row, for provenance.
    pub fingerprint: String,
}

impl LedgerBatch {
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }
}

/// Read a ledger CSV from disk.
pub fn read_ledger(path: &Path, columns: &ColumnConfig) -> Result<LedgerBatch, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "reading ledger");
    read_ledger_from_reader(file, columns)
}

/// Read a ledger CSV from any reader. The first row must be the header.
pub fn read_ledger_from_reader<R: Read>(
    reader: R,
    columns: &ColumnConfig,
) -> Result<LedgerBatch, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let resolved = ResolvedColumns::resolve(&headers, columns)?;
    debug!(
        controls = ?resolved.control_names(),
        has_size = resolved.size.is_some(),
        has_slippage = resolved.has_slippage(),
        "resolved ledger columns"
    );

    let mut hasher = blake3::Hasher::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut trades = Vec::new();
    let mut rejected = Vec::new();

    for (i, raw) in csv_reader.byte_records().enumerate() {
        let raw = raw?;
        for field in raw.iter() {
            hasher.update(field);
            hasher.update(&[0x1f]);
        }
        hasher.update(&[0x1e]);

        let line = raw.position().map(|p| p.line()).unwrap_or(i as u64 + 2);

        let row = match StringRecord::from_byte_record(raw) {
            Ok(row) => row,
            Err(err) => {
                let field = headers
                    .get(err.utf8_error().field())
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                let raw = err.into_byte_record();
                let id = raw
                    .get(resolved.id)
                    .and_then(|b| std::str::from_utf8(b).ok())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                reject(&mut rejected, line, id, DataError::InvalidEncoding { field });
                continue;
            }
        };
        let id = cell(&row, resolved.id).map(str::to_string);

        let parsed = parse_row(&row, &resolved).and_then(|trade| {
            if seen_ids.contains(&trade.id) {
                Err(DataError::DuplicateId {
                    id: trade.id.clone(),
                })
            } else {
                Ok(trade)
            }
        });

        match parsed {
            Ok(trade) => {
                seen_ids.insert(trade.id.clone());
                trades.push(trade);
            }
            Err(reason) => reject(&mut rejected, line, id, reason),
        }
    }

    info!(
        accepted = trades.len(),
        rejected = rejected.len(),
        "ledger ingested"
    );

    Ok(LedgerBatch {
        trades,
        controls: resolved.control_names(),
        has_size: resolved.size.is_some(),
        has_slippage: resolved.has_slippage(),
        rejected,
        fingerprint: hasher.finalize().to_hex().to_string(),
    })
}

fn reject(rejected: &mut Vec<RejectedRecord>, line: u64, id: Option<String>, reason: DataError) {
    warn!(line, id = ?id, %reason, "rejected ledger row");
    rejected.push(RejectedRecord {
        line: Some(line),
        id,
        reason,
    });
}

// ─── Row parsing ────────────────────────────────────────────────────

fn cell(row: &StringRecord, idx: usize) -> Option<&str> {
    row.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn required_cell<'a>(row: &'a StringRecord, idx: usize, field: &str) -> Result<&'a str, DataError> {
    cell(row, idx).ok_or_else(|| DataError::MissingValue {
        field: field.to_string(),
    })
}

fn required_number(row: &StringRecord, idx: usize, field: &str) -> Result<f64, DataError> {
    let raw = required_cell(row, idx, field)?;
    let value = parse::parse_number(raw).ok_or_else(|| DataError::InvalidNumber {
        field: field.to_string(),
        raw: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(DataError::NonFinite {
            field: field.to_string(),
        });
    }
    Ok(value)
}

fn required_timestamp(
    row: &StringRecord,
    idx: usize,
    field: &str,
) -> Result<NaiveDateTime, DataError> {
    let raw = required_cell(row, idx, field)?;
    parse::parse_timestamp(raw).ok_or_else(|| DataError::InvalidTimestamp {
        field: field.to_string(),
        raw: raw.to_string(),
    })
}

fn optional_number(row: &StringRecord, idx: Option<usize>) -> Option<f64> {
    idx.and_then(|i| cell(row, i))
        .and_then(parse::parse_number)
        .filter(|v| v.is_finite())
}

fn parse_row(row: &StringRecord, cols: &ResolvedColumns) -> Result<TradeRecord, DataError> {
    let id = required_cell(row, cols.id, columns::ID)?.to_string();
    let instrument = required_cell(row, cols.instrument, columns::INSTRUMENT)?.to_string();

    let raw_side = required_cell(row, cols.side, columns::SIDE)?;
    let side: Side = raw_side.parse().map_err(|_| DataError::UnknownSide {
        raw: raw_side.to_string(),
    })?;

    let entry_time = required_timestamp(row, cols.entry_time, columns::ENTRY_TIME)?;
    let exit_time = required_timestamp(row, cols.exit_time, columns::EXIT_TIME)?;
    let entry_price = required_number(row, cols.entry_price, columns::ENTRY_PRICE)?;
    let exit_price = required_number(row, cols.exit_price, columns::EXIT_PRICE)?;
    let assigned_probability = required_number(row, cols.probability, columns::PROBABILITY)?;

    let controls = cols
        .controls
        .iter()
        .map(|(_, idx)| cell(row, *idx).and_then(parse::parse_flag))
        .collect();

    Ok(TradeRecord {
        id,
        instrument,
        side,
        entry_time,
        entry_price,
        exit_time,
        exit_price,
        assigned_probability,
        size: optional_number(row, cols.size),
        estimated_slippage_pct: optional_number(row, cols.estimated_slippage),
        actual_slippage_pct: optional_number(row, cols.actual_slippage),
        controls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id_operacion,fecha_entrada,fecha_salida,activo,lado,precio_entrada,precio_salida,probabilidad_asignada";

    fn read(body: &str) -> Result<LedgerBatch, IngestError> {
        let csv = format!("{HEADER}\n{body}");
        read_ledger_from_reader(csv.as_bytes(), &ColumnConfig::default())
    }

    #[test]
    fn reads_minimal_ledger() {
        let batch = read(
            "T1,2024-01-02,2024-01-03,SPY,largo,100,110,0.6\n\
             T2,2024-01-04,2024-01-05,QQQ,corto,50,45,0.4\n",
        )
        .unwrap();

        assert_eq!(batch.len(), 2);
        assert!(batch.rejected.is_empty());
        assert!(batch.controls.is_empty());
        assert!(!batch.has_size);
        assert!(!batch.has_slippage);
        assert_eq!(batch.trades[1].side, Side::Short);
        assert_eq!(batch.trades[0].assigned_probability, 0.6);
    }

    #[test]
    fn unknown_side_rejected_with_line() {
        let batch = read(
            "T1,2024-01-02,2024-01-03,SPY,largo,100,110,0.6\n\
             T2,2024-01-04,2024-01-05,QQQ,sideways,50,45,0.4\n",
        )
        .unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.rejected.len(), 1);
        let rej = &batch.rejected[0];
        assert_eq!(rej.line, Some(3));
        assert_eq!(rej.id.as_deref(), Some("T2"));
        assert_eq!(
            rej.reason,
            DataError::UnknownSide {
                raw: "sideways".into()
            }
        );
    }

    #[test]
    fn bad_cells_are_rejected_individually() {
        let batch = read(
            "T1,not-a-date,2024-01-03,SPY,long,100,110,0.6\n\
             T2,2024-01-04,2024-01-05,QQQ,short,abc,45,0.4\n\
             T3,2024-01-04,2024-01-05,QQQ,short,50,45,\n\
             T4,2024-01-04,2024-01-05,QQQ,short,50,45,0.5\n",
        )
        .unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch.trades[0].id, "T4");
        assert!(matches!(
            batch.rejected[0].reason,
            DataError::InvalidTimestamp { .. }
        ));
        assert!(matches!(
            batch.rejected[1].reason,
            DataError::InvalidNumber { .. }
        ));
        assert!(matches!(
            batch.rejected[2].reason,
            DataError::MissingValue { .. }
        ));
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let batch = read(
            "T1,2024-01-02,2024-01-03,SPY,long,100,110,0.6\n\
             T1,2024-01-04,2024-01-05,QQQ,short,50,45,0.4\n",
        )
        .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.trades[0].instrument, "SPY");
        assert_eq!(
            batch.rejected[0].reason,
            DataError::DuplicateId { id: "T1".into() }
        );
    }

    #[test]
    fn missing_columns_refuse_batch() {
        let csv = "id_operacion,activo\nT1,SPY\n";
        let err = read_ledger_from_reader(csv.as_bytes(), &ColumnConfig::default()).unwrap_err();
        match err {
            IngestError::Validation(v) => assert_eq!(v.missing.len(), 6),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn optional_columns_are_coerced() {
        let csv = format!(
            "{HEADER},tamanio,slippage_estimado_pct,slippage_real_pct,regla_riesgo_ok\n\
             T1,2024-01-02,2024-01-03,SPY,long,100,110,0.6,2,0.1,0.3,true\n\
             T2,2024-01-04,2024-01-05,QQQ,short,50,45,0.4,big,,0.2,maybe\n"
        );
        let batch = read_ledger_from_reader(csv.as_bytes(), &ColumnConfig::default()).unwrap();

        assert!(batch.has_size);
        assert!(batch.has_slippage);
        assert_eq!(batch.controls, vec!["regla_riesgo_ok".to_string()]);

        let t1 = &batch.trades[0];
        assert_eq!(t1.size, Some(2.0));
        assert_eq!(t1.controls, vec![Some(true)]);

        let t2 = &batch.trades[1];
        assert_eq!(t2.size, None);
        assert_eq!(t2.weight(), 1.0);
        assert_eq!(t2.estimated_slippage_pct, None);
        assert_eq!(t2.actual_slippage_pct, Some(0.2));
        assert_eq!(t2.controls, vec![None]);
    }

    #[test]
    fn short_rows_are_rejected_not_fatal() {
        let batch = read(
            "T1,2024-01-02,2024-01-03,SPY,long,100\n\
             T2,2024-01-04,2024-01-05,QQQ,short,50,45,0.4\n",
        )
        .unwrap();
        assert_eq!(batch.len(), 1);
        assert!(matches!(
            batch.rejected[0].reason,
            DataError::MissingValue { .. }
        ));
    }

    #[test]
    fn fingerprint_is_deterministic_and_content_sensitive() {
        let a = read("T1,2024-01-02,2024-01-03,SPY,long,100,110,0.6\n").unwrap();
        let b = read("T1,2024-01-02,2024-01-03,SPY,long,100,110,0.6\n").unwrap();
        let c = read("T1,2024-01-02,2024-01-03,SPY,long,100,111,0.6\n").unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn invalid_utf8_row_is_rejected_not_fatal() {
        let mut csv =
            format!("{HEADER}\nT1,2024-01-02,2024-01-03,SPY,long,100,110,0.6\n").into_bytes();
        csv.extend_from_slice(b"T2,2024-01-03,2024-01-04,\xff\xfeQQ,long,100,110,0.6\n");
        csv.extend_from_slice(b"T3,2024-01-04,2024-01-05,IWM,short,50,45,0.4\n");

        let batch = read_ledger_from_reader(csv.as_slice(), &ColumnConfig::default()).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.trades[0].id, "T1");
        assert_eq!(batch.trades[1].id, "T3");
        assert_eq!(batch.rejected.len(), 1);
        let rej = &batch.rejected[0];
        assert_eq!(rej.line, Some(3));
        assert_eq!(rej.id.as_deref(), Some("T2"));
        assert_eq!(
            rej.reason,
            DataError::InvalidEncoding {
                field: "activo".into()
            }
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_ledger(Path::new("/nonexistent/ledger.csv"), &ColumnConfig::default())
            .unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
