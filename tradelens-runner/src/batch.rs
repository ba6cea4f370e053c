//! Multi-ledger analysis: several independent ledgers in one call.
//!
//! Each ledger is analysed on its own; one failing file never affects the
//! others. Output order always matches input order.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::info;

use crate::analysis::{analyze_ledger, AnalysisError, AnalysisReport};
use crate::config::AnalysisConfig;

/// Result for one ledger file.
#[derive(Debug)]
pub struct LedgerOutcome {
    pub path: PathBuf,
    pub result: Result<AnalysisReport, AnalysisError>,
}

impl LedgerOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Runs the pipeline over a list of ledgers, optionally in parallel.
pub struct BatchAnalyzer {
    config: AnalysisConfig,
    parallel: bool,
}

impl BatchAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze_all<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<LedgerOutcome> {
        let outcomes: Vec<LedgerOutcome> = if self.parallel {
            paths.par_iter().map(|p| self.analyze_one(p.as_ref())).collect()
        } else {
            paths.iter().map(|p| self.analyze_one(p.as_ref())).collect()
        };

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(ledgers = outcomes.len(), failed, "batch analysis complete");
        outcomes
    }

    fn analyze_one(&self, path: &Path) -> LedgerOutcome {
        LedgerOutcome {
            path: path.to_path_buf(),
            result: analyze_ledger(path, &self.config),
        }
    }
}
