//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization of the [`AnalysisReport`] with
//!   schema versioning. Newer versions are rejected on load.
//! - **CSV**: enriched trade tape and the equity/drawdown curve.
//! - **Markdown**: human-readable report, also what the CLI prints.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tradelens_core::EnrichedTrade;

use crate::analysis::{AnalysisReport, SCHEMA_VERSION};
use crate::calibration::BIN_COUNT;
use crate::equity::EquityCurve;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize an `AnalysisReport` to pretty JSON.
pub fn export_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize AnalysisReport to JSON")
}

/// Deserialize an `AnalysisReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<AnalysisReport> {
    let report: AnalysisReport =
        serde_json::from_str(json).context("failed to deserialize AnalysisReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    if report.calibration.bins.len() != BIN_COUNT {
        bail!(
            "calibration must have {} bins, found {}",
            BIN_COUNT,
            report.calibration.bins.len()
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the enriched trade tape.
///
/// Fixed columns: id, instrument, side, entry_time, entry_price, exit_time,
/// exit_price, assigned_probability, size, estimated_slippage_pct,
/// actual_slippage_pct, realized_return, is_win; then one column per control
/// in `controls` order. Absent optional values are empty cells.
pub fn export_trades_csv(trades: &[EnrichedTrade], controls: &[String]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<&str> = vec![
        "id",
        "instrument",
        "side",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "assigned_probability",
        "size",
        "estimated_slippage_pct",
        "actual_slippage_pct",
        "realized_return",
        "is_win",
    ];
    header.extend(controls.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for t in trades {
        let r = t.record();
        let mut row = vec![
            r.id.clone(),
            r.instrument.clone(),
            r.side.to_string(),
            r.entry_time.format(TIME_FORMAT).to_string(),
            format!("{:.6}", r.entry_price),
            r.exit_time.format(TIME_FORMAT).to_string(),
            format!("{:.6}", r.exit_price),
            format!("{:.4}", r.assigned_probability),
            opt(r.size, 4),
            opt(r.estimated_slippage_pct, 4),
            opt(r.actual_slippage_pct, 4),
            format!("{:.6}", t.realized_return()),
            t.is_win().to_string(),
        ];
        row.extend(
            (0..controls.len()).map(|i| match r.controls.get(i).copied().flatten() {
                Some(flag) => flag.to_string(),
                None => String::new(),
            }),
        );
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the equity and drawdown series, one row per trade in exit order.
pub fn export_equity_csv(curve: &EquityCurve) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["exit_time", "trade_id", "equity", "drawdown"])?;
    for (e, d) in curve.equity.iter().zip(&curve.drawdown) {
        wtr.write_record([
            e.exit_time.format(TIME_FORMAT).to_string(),
            e.trade_id.clone(),
            format!("{:.6}", e.equity),
            opt(d.drawdown, 6),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_default()
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one analysis.
///
/// Creates `analysis_{fingerprint prefix}_{timestamp}/` under `output_dir`
/// containing `report.json`, `trades.csv`, `equity.csv` and `report.md`.
/// An existing directory is never reused: a `_2`, `_3`, ... suffix is added.
/// Returns the path to the created directory.
pub fn save_artifacts(report: &AnalysisReport, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = report.ledger_fingerprint.chars().take(8).collect();
    let base = format!(
        "analysis_{}_{}",
        prefix,
        chrono::Local::now().format("%Y%m%d_%H%M%S_%3f")
    );
    let run_dir = create_run_dir(output_dir, &base)?;

    write(&run_dir.join("report.json"), &export_json(report)?)?;
    write(
        &run_dir.join("trades.csv"),
        &export_trades_csv(&report.trades, &report.controls)?,
    )?;
    write(&run_dir.join("equity.csv"), &export_equity_csv(&report.equity)?)?;
    write(&run_dir.join("report.md"), &generate_report(report))?;

    Ok(run_dir)
}

/// Load an `AnalysisReport` from an artifact directory's report.json.
pub fn load_artifacts(dir: &Path) -> Result<AnalysisReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn create_run_dir(output_dir: &Path, base: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    for attempt in 1u32.. {
        let name = if attempt == 1 {
            base.to_string()
        } else {
            format!("{base}_{attempt}")
        };
        let candidate = output_dir.join(name);
        match std::fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("failed to create artifact dir: {}", candidate.display())
                })
            }
        }
    }
    bail!("no free artifact directory name for {base}")
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Markdown report ────────────────────────────────────────────────

/// Human-readable report covering every section of the analysis.
pub fn generate_report(report: &AnalysisReport) -> String {
    let s = &report.summary;
    let mut md = String::with_capacity(2048);

    md.push_str("# Trade Ledger Analysis\n\n");

    md.push_str("## Alerts\n\n");
    for line in report.alerts.messages() {
        md.push_str(&format!("- {line}\n"));
    }
    md.push('\n');

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Trades | {} ({} wins / {} losses) |\n",
        s.trade_count, s.win_count, s.loss_count
    ));
    md.push_str(&format!("| Win Rate | {} |\n", pct(Some(s.win_rate))));
    md.push_str(&format!("| Mean Gain | {} |\n", pct(s.mean_gain)));
    md.push_str(&format!("| Mean Loss | {} |\n", pct(s.mean_loss)));
    md.push_str(&format!("| Expectancy | {} |\n", pct(s.expectancy)));
    md.push_str(&format!("| Mean Return | {} |\n", pct(Some(s.mean_return))));
    md.push_str(&format!("| Return Std Dev | {} |\n", pct(s.return_std_dev)));
    md.push_str(&format!("| Sharpe (per trade) | {} |\n", num(s.sharpe_ratio, 3)));
    md.push_str(&format!("| Total Return | {} |\n", pct(Some(s.total_return))));
    md.push_str(&format!("| Max Drawdown | {} |\n", pct(s.max_drawdown)));
    md.push_str(&format!("| Brier Score | {:.4} |\n", s.brier_score));
    md.push('\n');

    md.push_str("## Calibration\n\n");
    md.push_str("| Bin | Center | Trades | Win Frequency |\n");
    md.push_str("| --- | --- | --- | --- |\n");
    for bin in &report.calibration.bins {
        md.push_str(&format!(
            "| [{:.1}, {:.1}{} | {:.1} | {} | {} |\n",
            bin.lower,
            bin.upper,
            if bin.upper >= 1.0 { "]" } else { ")" },
            bin.center,
            bin.count,
            pct(bin.frequency)
        ));
    }
    md.push('\n');

    if !report.adherence.is_empty() {
        md.push_str("## Process Adherence\n\n");
        md.push_str("| Control | Compliance | Observed |\n");
        md.push_str("| --- | --- | --- |\n");
        for entry in &report.adherence {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                entry.control,
                pct(entry.compliance),
                entry.observed
            ));
        }
        md.push('\n');
    }

    if !report.slippage.points.is_empty() {
        md.push_str("## Slippage\n\n");
        md.push_str(&format!(
            "{} trade(s) with both estimates, mean deviation {}\n\n",
            report.slippage.points.len(),
            num(report.slippage.mean_deviation, 4)
        ));
    }

    md.push_str("## Return Distribution\n\n");
    md.push_str(&format!(
        "Normal fit: mean {}, std {}\n\n",
        pct(report.distribution.mean),
        pct(report.distribution.std_dev)
    ));
    md.push_str("| Range | Trades |\n");
    md.push_str("| --- | --- |\n");
    for bin in &report.distribution.bins {
        md.push_str(&format!(
            "| {} to {} | {} |\n",
            pct(Some(bin.lower)),
            pct(Some(bin.upper)),
            bin.count
        ));
    }
    md.push('\n');

    if !report.rejected.is_empty() {
        md.push_str("## Rejected Records\n\n");
        for r in &report.rejected {
            md.push_str(&format!("- {r}\n"));
        }
        md.push('\n');
    }

    md.push_str(&format!("Ledger fingerprint: `{}`\n", report.ledger_fingerprint));
    md
}

fn pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_else(|| "n/a".into())
}

fn num(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "n/a".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::config::AnalysisConfig;
    use tradelens_core::read_ledger_from_reader;

    const LEDGER: &str = "\
id_operacion,fecha_entrada,fecha_salida,activo,lado,precio_entrada,precio_salida,probabilidad_asignada,tamanio,slippage_estimado_pct,slippage_real_pct,regla_riesgo_ok
T1,2024-01-02,2024-01-05,SPY,long,100,105,0.6,1,0.10,0.15,true
T2,2024-01-03,2024-01-04,QQQ,short,200,210,0.4,,0.10,,false
T3,2024-01-04,2024-01-09,IWM,long,50,51,0.5,2,,,si
";

    fn sample_report() -> AnalysisReport {
        let config = AnalysisConfig::default();
        let batch = read_ledger_from_reader(LEDGER.as_bytes(), &config.columns).unwrap();
        analyze(&batch, &config).unwrap()
    }

    #[test]
    fn json_roundtrip() {
        let report = sample_report();
        let json = export_json(&report).unwrap();
        let restored = import_json(&json).unwrap();
        assert_eq!(restored.schema_version, SCHEMA_VERSION);
        assert_eq!(restored.ledger_fingerprint, report.ledger_fingerprint);
        assert_eq!(restored.trades.len(), report.trades.len());
        assert_eq!(restored.trades[0].record(), report.trades[0].record());
        assert_eq!(restored.summary.trade_count, report.summary.trade_count);
        assert_eq!(restored.equity.len(), report.equity.len());
        assert_eq!(restored.alerts.messages(), report.alerts.messages());
        assert_eq!(restored.controls, report.controls);
    }

    #[test]
    fn json_rejects_unknown_version() {
        let mut report = sample_report();
        report.schema_version = 99;
        let json = export_json(&report).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn json_rejects_wrong_calibration_bin_count() {
        let mut report = sample_report();
        report.calibration.bins.truncate(2);
        let json = export_json(&report).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("calibration must have 5 bins"));
    }

    #[test]
    fn json_without_version_defaults_to_current() {
        let report = sample_report();
        let mut value = serde_json::to_value(&report).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let restored = import_json(&value.to_string()).unwrap();
        assert_eq!(restored.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn csv_trades_columns_and_controls() {
        let report = sample_report();
        let csv = export_trades_csv(&report.trades, &report.controls).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("id,instrument,side,entry_time"));
        assert!(header.ends_with("realized_return,is_win,regla_riesgo_ok"));

        let first: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(first[0], "T1");
        assert_eq!(first[2], "Long");
        assert_eq!(first[11], "0.050000");
        assert_eq!(first[12], "true");
        assert_eq!(first[13], "true");

        let second: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(second[8], "", "missing size stays empty");
        assert_eq!(second[10], "");
        assert_eq!(second[12], "false");
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn csv_empty_trades() {
        let csv = export_trades_csv(&[], &[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn csv_equity_in_exit_order() {
        let report = sample_report();
        let csv = export_equity_csv(&report.equity).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "exit_time,trade_id,equity,drawdown");
        assert_eq!(lines.len(), 4);
        // T2 exits first with a loss; the peak is not positive yet.
        assert!(lines[1].starts_with("2024-01-04 00:00:00,T2,-0.050000,"));
        assert!(lines[1].ends_with(','));
    }

    #[test]
    fn markdown_report_has_sections() {
        let md = generate_report(&sample_report());
        assert!(md.contains("# Trade Ledger Analysis"));
        assert!(md.contains("## Alerts"));
        assert!(md.contains("## Performance"));
        assert!(md.contains("## Calibration"));
        assert!(md.contains("## Process Adherence"));
        assert!(md.contains("regla_riesgo_ok"));
        assert!(md.contains("## Slippage"));
        assert!(md.contains("## Return Distribution"));
        assert!(!md.contains("## Rejected Records"));
    }

    #[test]
    fn same_report_saved_twice_gets_distinct_dirs() {
        let report = sample_report();
        let dir = tempfile::tempdir().unwrap();
        let first = save_artifacts(&report, dir.path()).unwrap();
        let second = save_artifacts(&report, dir.path()).unwrap();
        assert_ne!(first, second);
        assert!(first.join("report.json").exists());
        assert!(second.join("report.json").exists());
    }

    #[test]
    fn taken_dir_name_gets_a_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let a = create_run_dir(dir.path(), "analysis_x").unwrap();
        let b = create_run_dir(dir.path(), "analysis_x").unwrap();
        assert_eq!(a, dir.path().join("analysis_x"));
        assert_eq!(b, dir.path().join("analysis_x_2"));
    }

    #[test]
    fn save_load_artifacts_roundtrip() {
        let report = sample_report();
        let dir = tempfile::tempdir().unwrap();
        let run_dir = save_artifacts(&report, dir.path()).unwrap();

        for name in ["report.json", "trades.csv", "equity.csv", "report.md"] {
            assert!(run_dir.join(name).exists(), "{name} missing");
        }
        let loaded = load_artifacts(&run_dir).unwrap();
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
        assert_eq!(loaded.ledger_fingerprint, report.ledger_fingerprint);
        assert_eq!(loaded.trades.len(), report.trades.len());
    }
}
