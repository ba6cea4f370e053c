//! Alert rules over the computed aggregates.
//!
//! Rules run in a fixed order: calibration, then each adherence control in
//! declaration order, then expectancy. Undefined inputs never fire a rule.

use serde::{Deserialize, Serialize};

use crate::adherence::AdherenceEntry;
use crate::calibration::CalibrationReport;
use crate::summary::PerformanceSummary;

/// Status text reported when no rule fires.
pub const NO_CRITICAL_ALERTS: &str = "no critical alerts";

/// Rule thresholds. Both are overridable from the `[thresholds]` config table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Maximum tolerated `|frequency - center|` in the middle calibration bin.
    pub calibration_tolerance: f64,
    /// Minimum acceptable compliance per control.
    pub min_adherence: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            calibration_tolerance: 0.15,
            min_adherence: 0.70,
        }
    }
}

/// What a rule detected, without the rendered text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertKind {
    CalibrationDeviation { center: f64, frequency: f64 },
    LowAdherence { control: String, compliance: f64 },
    NegativeExpectancy { expectancy: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    fn new(kind: AlertKind) -> Self {
        let message = match &kind {
            AlertKind::CalibrationDeviation { center, frequency } => format!(
                "calibration deviation near 50%: win frequency {:.0}% vs expected {:.0}%",
                frequency * 100.0,
                center * 100.0
            ),
            AlertKind::LowAdherence {
                control,
                compliance,
            } => format!("low adherence on '{control}': {:.0}%", compliance * 100.0),
            AlertKind::NegativeExpectancy { expectancy } => format!(
                "negative per-trade expectancy: {:.2}%",
                expectancy * 100.0
            ),
        };
        Self { kind, message }
    }
}

/// Result of one evaluation. `Clear` is an explicit status, not an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "alerts", rename_all = "snake_case")]
pub enum AlertOutcome {
    Clear,
    Triggered(Vec<Alert>),
}

impl AlertOutcome {
    pub fn alerts(&self) -> &[Alert] {
        match self {
            AlertOutcome::Clear => &[],
            AlertOutcome::Triggered(alerts) => alerts,
        }
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, AlertOutcome::Clear)
    }

    /// Rendered lines, or the single "no critical alerts" status.
    pub fn messages(&self) -> Vec<String> {
        match self {
            AlertOutcome::Clear => vec![NO_CRITICAL_ALERTS.to_string()],
            AlertOutcome::Triggered(alerts) => alerts.iter().map(|a| a.message.clone()).collect(),
        }
    }
}

pub fn evaluate_alerts(
    calibration: &CalibrationReport,
    adherence: &[AdherenceEntry],
    summary: &PerformanceSummary,
    thresholds: &AlertThresholds,
) -> AlertOutcome {
    let mut alerts = Vec::new();

    if let Some(middle) = calibration.middle_bin() {
        if let Some(frequency) = middle.frequency {
            if (frequency - middle.center).abs() > thresholds.calibration_tolerance {
                alerts.push(Alert::new(AlertKind::CalibrationDeviation {
                    center: middle.center,
                    frequency,
                }));
            }
        }
    }

    for entry in adherence {
        if let Some(compliance) = entry.compliance {
            if compliance < thresholds.min_adherence {
                alerts.push(Alert::new(AlertKind::LowAdherence {
                    control: entry.control.clone(),
                    compliance,
                }));
            }
        }
    }

    if let Some(expectancy) = summary.expectancy {
        if expectancy < 0.0 {
            alerts.push(Alert::new(AlertKind::NegativeExpectancy { expectancy }));
        }
    }

    if alerts.is_empty() {
        AlertOutcome::Clear
    } else {
        AlertOutcome::Triggered(alerts)
    }
}
