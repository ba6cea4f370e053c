//! TradeLens Runner: analyzers, alert rules, and the analysis pipeline.
//!
//! This crate builds on `tradelens-core` to provide:
//! - Return stage and the calibration, performance, equity, slippage,
//!   adherence and distribution analyzers
//! - Fixed-order alert rules with configurable thresholds
//! - TOML configuration
//! - The one-pass analysis pipeline and its JSON/CSV/Markdown exports
//! - Parallel analysis of independent ledgers

pub mod adherence;
pub mod alerts;
pub mod analysis;
pub mod batch;
pub mod calibration;
pub mod config;
pub mod distribution;
pub mod equity;
pub mod export;
pub mod returns;
pub mod slippage;
pub mod summary;

#[cfg(test)]
mod test_support;

pub use adherence::{adherence, AdherenceEntry};
pub use alerts::{
    evaluate_alerts, Alert, AlertKind, AlertOutcome, AlertThresholds, NO_CRITICAL_ALERTS,
};
pub use analysis::{analyze, analyze_ledger, AnalysisError, AnalysisReport, SCHEMA_VERSION};
pub use batch::{BatchAnalyzer, LedgerOutcome};
pub use calibration::{calibrate, CalibrationBin, CalibrationReport};
pub use config::{AnalysisConfig, ConfigError, DistributionConfig};
pub use distribution::{return_distribution, HistogramBin, ReturnDistribution};
pub use equity::{build_equity_curve, DrawdownPoint, EquityCurve, EquityPoint};
pub use returns::{enrich, Enrichment};
pub use slippage::{slippage_deviation, SlippagePoint, SlippageReport};
pub use summary::PerformanceSummary;
