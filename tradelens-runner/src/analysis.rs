//! Analysis pipeline: wires ingestion, every analyzer and the alert rules.
//!
//! Two entry points:
//! - `analyze()`: takes an already ingested [`LedgerBatch`]; no I/O.
//! - `analyze_ledger()`: reads the CSV first. Used by the CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use tradelens_core::{read_ledger, EnrichedTrade, IngestError, LedgerBatch, RejectedRecord};

use crate::adherence::{adherence, AdherenceEntry};
use crate::alerts::{evaluate_alerts, AlertOutcome};
use crate::calibration::{calibrate, CalibrationReport};
use crate::config::AnalysisConfig;
use crate::distribution::{return_distribution, ReturnDistribution};
use crate::equity::{build_equity_curve, EquityCurve};
use crate::returns::enrich;
use crate::slippage::{slippage_deviation, SlippageReport};
use crate::summary::PerformanceSummary;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Nothing left to analyse after validation and rejection.
    #[error("no analysable trades ({} record(s) rejected)", rejected.len())]
    EmptyBatch { rejected: Vec<RejectedRecord> },
}

/// Everything one analysis pass produces. The presentation layer reads from
/// this and never recomputes derived values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// BLAKE3 over the ledger rows.
    pub ledger_fingerprint: String,
    /// Control columns found in the ledger, in declaration order.
    pub controls: Vec<String>,
    pub trades: Vec<EnrichedTrade>,
    pub calibration: CalibrationReport,
    pub summary: PerformanceSummary,
    pub equity: EquityCurve,
    pub slippage: SlippageReport,
    pub adherence: Vec<AdherenceEntry>,
    pub distribution: ReturnDistribution,
    pub alerts: AlertOutcome,
    /// Ingestion and return-stage rejections, in that order.
    pub rejected: Vec<RejectedRecord>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Read a ledger CSV and analyse it.
pub fn analyze_ledger(path: &Path, config: &AnalysisConfig) -> Result<AnalysisReport, AnalysisError> {
    let batch = read_ledger(path, &config.columns)?;
    analyze(&batch, config)
}

/// Run every analyzer over an ingested batch.
///
/// Pure with respect to its inputs: the same batch and config always produce
/// the same report.
pub fn analyze(batch: &LedgerBatch, config: &AnalysisConfig) -> Result<AnalysisReport, AnalysisError> {
    let enrichment = enrich(&batch.trades);
    let mut rejected = batch.rejected.clone();
    rejected.extend(enrichment.rejected);
    let trades = enrichment.trades;
    debug!(accepted = trades.len(), rejected = rejected.len(), "return stage done");

    if trades.is_empty() {
        return Err(AnalysisError::EmptyBatch { rejected });
    }

    let calibration = calibrate(&trades);
    let equity = build_equity_curve(&trades);
    let summary = PerformanceSummary::compute(&trades, &calibration, &equity)
        .ok_or_else(|| AnalysisError::EmptyBatch {
            rejected: rejected.clone(),
        })?;
    debug!(
        win_rate = summary.win_rate,
        expectancy = ?summary.expectancy,
        brier = summary.brier_score,
        "summary computed"
    );

    let slippage = slippage_deviation(&trades);
    let adherence = adherence(&batch.controls, &trades);
    let returns: Vec<f64> = trades.iter().map(|t| t.realized_return()).collect();
    let distribution = return_distribution(&returns, config.distribution.histogram_bins);
    let alerts = evaluate_alerts(&calibration, &adherence, &summary, &config.thresholds);

    info!(
        trades = trades.len(),
        rejected = rejected.len(),
        alerts = alerts.alerts().len(),
        "analysis complete"
    );

    Ok(AnalysisReport {
        schema_version: SCHEMA_VERSION,
        ledger_fingerprint: batch.fingerprint.clone(),
        controls: batch.controls.clone(),
        trades,
        calibration,
        summary,
        equity,
        slippage,
        adherence,
        distribution,
        alerts,
        rejected,
    })
}
