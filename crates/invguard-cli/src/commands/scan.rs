//! Scan command - screen one or more documents for fraud patterns.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::SecondsFormat;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use invguard_core::{BatchSummary, DocumentReport, FileOutcome, FraudScanner, InvguardConfig};

use super::config::load_config;
use crate::prices::HttpPriceSource;
use crate::sink::{format_report, ConsoleSink};

/// Arguments for the scan command.
#[derive(Args)]
pub struct ScanArgs {
    /// Input files or glob patterns, scanned in the order given
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write the combined output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write one output file per scanned document into this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// JSON file with market reference prices (overrides the config)
    #[arg(long)]
    prices: Option<PathBuf>,

    /// Skip a rule (key or label); may be repeated
    #[arg(long = "disable", value_name = "RULE")]
    disabled: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON report (an array of per-file outcomes for batches)
    Json,
    /// One CSV row per finding
    Csv,
    /// Human readable findings and tally
    Text,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ScanArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(prices) = &args.prices {
        config.prices.file = Some(prices.clone());
    }
    config.rules.disabled.extend(args.disabled.iter().cloned());

    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for: {}", args.inputs.join(", "));
    }

    eprintln!(
        "{} Found {} files to scan",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let mut scanner = build_scanner(&config)?;

    let progress = (files.len() > 1).then(|| {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb
    });

    let print_live = args.format == OutputFormat::Text && args.output.is_none();
    let mut sink = ConsoleSink::new(progress.clone(), print_live);
    let summary = scanner.process_batch(&files, &mut sink).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if let Some(ref output_dir) = args.output_dir {
        for report in summary.outcomes.iter().filter_map(FileOutcome::report) {
            let output_path = output_dir.join(format!(
                "{}.{}",
                file_stem(&report.source),
                args.format.extension()
            ));
            let output = render_report(report, args.format)?;
            fs::write(&output_path, console::strip_ansi_codes(&output).as_bytes())?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if print_live {
        println!();
        sink.print_tally();
    } else {
        let output = render_summary(&summary, args.format)?;

        match &args.output {
            Some(output_path) => {
                fs::write(output_path, console::strip_ansi_codes(&output).as_bytes())?;
                eprintln!(
                    "{} Output written to {}",
                    style("✓").green(),
                    output_path.display()
                );
            }
            None => print!("{}", output),
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &summary)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    info!("Scan finished in {:?}", start.elapsed());
    eprintln!(
        "{} Scanned {} files in {:?}: {} flagged, {} failed",
        style("✓").green(),
        summary.scanned(),
        start.elapsed(),
        style(summary.flagged()).yellow(),
        style(summary.failed()).red()
    );

    Ok(())
}

fn build_scanner(config: &InvguardConfig) -> anyhow::Result<FraudScanner> {
    let scanner = FraudScanner::new(config);

    let uses_http = config.prices.file.is_none() && config.prices.table.is_empty();
    match &config.prices.url {
        Some(url) if uses_http => {
            info!("Using market prices from {}", url);
            let source = HttpPriceSource::new(url.clone(), config.prices.timeout_ms)?;
            Ok(scanner.with_price_source(Arc::new(source)))
        }
        _ => Ok(scanner),
    }
}

/// Expand glob patterns; plain paths are kept as given so that missing or
/// unsupported files show up as failures.
fn collect_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            files.push(PathBuf::from(input));
            continue;
        }

        let before = files.len();
        files.extend(glob(input)?.filter_map(|r| r.ok()).filter(|p| p.is_file()));
        if files.len() == before {
            warn!("Pattern matched no files: {}", input);
        }
    }

    Ok(files)
}

fn file_stem(source: &str) -> String {
    Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

/// Output for a single scanned document.
fn render_report(report: &DocumentReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)? + "\n"),
        OutputFormat::Csv => format_findings_csv(std::slice::from_ref(report)),
        OutputFormat::Text => Ok(format_report(report).join("\n") + "\n"),
    }
}

/// Combined output for the whole batch. A single scanned input renders as
/// its report alone.
fn render_summary(summary: &BatchSummary, format: OutputFormat) -> anyhow::Result<String> {
    if let [FileOutcome::Scanned(report)] = summary.outcomes.as_slice() {
        return render_report(report, format);
    }

    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&summary.outcomes)? + "\n"),
        OutputFormat::Csv => {
            let reports: Vec<DocumentReport> = summary
                .outcomes
                .iter()
                .filter_map(FileOutcome::report)
                .cloned()
                .collect();
            format_findings_csv(&reports)
        }
        OutputFormat::Text => {
            let mut output = String::new();
            for outcome in &summary.outcomes {
                match outcome {
                    FileOutcome::Scanned(report) => {
                        output.push_str(&format_report(report).join("\n"));
                        output.push('\n');
                    }
                    FileOutcome::Failed { source, error } => {
                        output.push_str(&format!("✗ {}: {}\n", source, error));
                    }
                }
            }
            Ok(output)
        }
    }
}

fn format_findings_csv(reports: &[DocumentReport]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["file", "type", "risk", "details"])?;

    for record in reports.iter().flat_map(DocumentReport::export_records) {
        wtr.write_record([
            record.file.as_str(),
            record.fraud_type.label(),
            record.risk.as_str(),
            record.details.as_str(),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn write_summary(path: &Path, summary: &BatchSummary) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "findings",
        "max_risk",
        "types",
        "rule_errors",
        "scanned_at",
        "error",
    ])?;

    for outcome in &summary.outcomes {
        match outcome {
            FileOutcome::Scanned(report) => {
                let types: Vec<&str> = report.findings.iter().map(|f| f.fraud_type.label()).collect();
                let status = if report.findings.is_empty() { "clean" } else { "flagged" };
                wtr.write_record([
                    report.source.as_str(),
                    status,
                    &report.findings.len().to_string(),
                    report.max_risk().map(|r| r.as_str()).unwrap_or(""),
                    &types.join("; "),
                    &report.rule_errors.len().to_string(),
                    &report.scanned_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                    "",
                ])?;
            }
            FileOutcome::Failed { source, error } => {
                wtr.write_record([source.as_str(), "error", "", "", "", "", "", error.as_str()])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
