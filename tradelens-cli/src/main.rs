//! TradeLens CLI: analyze and validate trade ledgers.
//!
//! Commands:
//! - `analyze`: analyse one or more ledgers and print summaries (or JSON)
//! - `validate`: ingestion only, report accepted and rejected rows

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tradelens_core::{read_ledger, LedgerBatch, RejectedRecord};
use tradelens_runner::export::save_artifacts;
use tradelens_runner::{
    AnalysisConfig, AnalysisError, AnalysisReport, BatchAnalyzer, LedgerOutcome,
};

#[derive(Parser)]
#[command(
    name = "tradelens",
    about = "TradeLens CLI: trade ledger calibration and performance analysis"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more ledger CSVs and report calibration, performance and alerts.
    Analyze {
        /// Paths to ledger CSVs. Several ledgers are analysed in parallel.
        #[arg(required = true)]
        ledgers: Vec<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the full JSON report instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Write report.json, trades.csv, equity.csv and report.md under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Check a ledger CSV without analysing it.
    Validate {
        /// Path to the ledger CSV.
        ledger: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            ledgers,
            config,
            json,
            output_dir,
        } => run_analyze(&ledgers, config.as_deref(), json, output_dir.as_deref()),
        Commands::Validate { ledger, config } => run_validate(&ledger, config.as_deref()),
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_ledger(path: &Path, config: &AnalysisConfig) -> Result<LedgerBatch> {
    read_ledger(path, &config.columns)
        .with_context(|| format!("failed to read ledger {}", path.display()))
}

fn run_analyze(
    ledgers: &[PathBuf],
    config_path: Option<&Path>,
    json: bool,
    output_dir: Option<&Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    debug!(?config, "configuration loaded");
    let outcomes = BatchAnalyzer::new(config).analyze_all(ledgers);
    let multiple = outcomes.len() > 1;

    if json {
        if let Some(out) = json_output(&outcomes)? {
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    let mut failed = 0usize;
    for outcome in outcomes {
        let report = match outcome.result {
            Ok(report) => report,
            Err(err) => {
                failed += 1;
                report_failure(&outcome.path, err);
                continue;
            }
        };

        if !json {
            if multiple {
                println!();
                println!("##### {} #####", outcome.path.display());
            }
            print_summary(&report);
        }

        if let Some(dir) = output_dir {
            let run_dir = save_artifacts(&report, dir)?;
            eprintln!("Artifacts saved to: {}", run_dir.display());
        }
    }

    if failed > 0 {
        bail!("{failed} of {} ledger(s) could not be analysed", ledgers.len());
    }
    Ok(())
}

/// A single ledger prints its bare report. Several ledgers print an array
/// with one `{path, report}` or `{path, error}` entry per input, in order.
fn json_output(outcomes: &[LedgerOutcome]) -> Result<Option<Value>> {
    if let [single] = outcomes {
        return match &single.result {
            Ok(report) => Ok(Some(serde_json::to_value(report)?)),
            Err(_) => Ok(None),
        };
    }

    let mut entries = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let mut entry = Map::new();
        entry.insert(
            "path".into(),
            Value::String(outcome.path.display().to_string()),
        );
        match &outcome.result {
            Ok(report) => entry.insert("report".into(), serde_json::to_value(report)?),
            Err(err) => entry.insert("error".into(), Value::String(err.to_string())),
        };
        entries.push(Value::Object(entry));
    }
    Ok(Some(Value::Array(entries)))
}

fn report_failure(path: &Path, err: AnalysisError) {
    match err {
        AnalysisError::EmptyBatch { rejected } => {
            eprintln!("Error for {}: no analysable trades", path.display());
            print_rejections(&rejected);
        }
        other => eprintln!("Error for {}: {other}", path.display()),
    }
}

fn run_validate(ledger: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let batch = load_ledger(ledger, &config)?;

    println!("Ledger:         {}", ledger.display());
    println!("Accepted:       {}", batch.len());
    println!("Rejected:       {}", batch.rejected.len());
    println!(
        "Controls:       {}",
        if batch.controls.is_empty() {
            "none".to_string()
        } else {
            batch.controls.join(", ")
        }
    );
    println!("Size column:    {}", yes_no(batch.has_size));
    println!("Slippage:       {}", yes_no(batch.has_slippage));
    println!("Fingerprint:    {}", batch.fingerprint);
    print_rejections(&batch.rejected);
    Ok(())
}

fn print_rejections(rejected: &[RejectedRecord]) {
    if rejected.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("--- Rejected Records ---");
    for record in rejected {
        eprintln!("  {record}");
    }
}

fn print_summary(report: &AnalysisReport) {
    let s = &report.summary;
    println!();
    println!("=== Ledger Analysis ===");
    println!(
        "Trades:         {} ({} wins / {} losses)",
        s.trade_count, s.win_count, s.loss_count
    );
    println!("Rejected:       {}", report.rejected.len());
    println!();
    println!("--- Performance ---");
    println!("Win Rate:       {:.1}%", s.win_rate * 100.0);
    println!("Mean Gain:      {}", pct(s.mean_gain));
    println!("Mean Loss:      {}", pct(s.mean_loss));
    println!("Expectancy:     {}", pct(s.expectancy));
    println!("Total Return:   {:.2}%", s.total_return * 100.0);
    println!("Max Drawdown:   {}", pct(s.max_drawdown));
    println!(
        "Sharpe:         {}",
        s.sharpe_ratio
            .map(|v| format!("{v:.3}"))
            .unwrap_or_else(|| "n/a".into())
    );
    println!("Brier Score:    {:.4}", s.brier_score);
    println!();
    println!("--- Calibration ---");
    for bin in &report.calibration.bins {
        println!(
            "  {:.1}: {:>8}  ({} trades)",
            bin.center,
            pct(bin.frequency),
            bin.count
        );
    }
    if !report.adherence.is_empty() {
        println!();
        println!("--- Process Adherence ---");
        for entry in &report.adherence {
            println!("  {:<20} {}", entry.control, pct(entry.compliance));
        }
    }
    if let Some(mean) = report.slippage.mean_deviation {
        println!();
        println!(
            "Slippage:       {:+.4} mean deviation over {} trade(s)",
            mean,
            report.slippage.points.len()
        );
    }
    println!();
    println!("--- Alerts ---");
    for line in report.alerts.messages() {
        println!("  {line}");
    }
    print_rejections(&report.rejected);
}

fn pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_else(|| "n/a".into())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
