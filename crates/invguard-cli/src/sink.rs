//! Console reporting for scan results.

use console::{style, StyledObject};
use indicatif::ProgressBar;

use invguard_core::{DocumentReport, FileOutcome, FindingTally, ReportSink, RiskLevel};

/// Prints each file's findings as it is scanned.
pub struct ConsoleSink {
    progress: Option<ProgressBar>,
    /// Print per-file results (text output only).
    verbose: bool,
    /// Latest tally, printed once the batch is done.
    tally: FindingTally,
}

impl ConsoleSink {
    pub fn new(progress: Option<ProgressBar>, verbose: bool) -> Self {
        Self {
            progress,
            verbose,
            tally: FindingTally::default(),
        }
    }

    fn print(&self, lines: &[String]) {
        let emit = || {
            for line in lines {
                println!("{}", line);
            }
        };

        match &self.progress {
            Some(pb) => pb.suspend(emit),
            None => emit(),
        }
    }

    /// Print the finding counts by type and by risk.
    pub fn print_tally(&self) {
        if self.tally.total() == 0 {
            println!("{} No findings", style("✓").green());
            return;
        }

        println!("{}", style("Findings by type:").bold());
        for (fraud_type, count) in &self.tally.by_type {
            println!("  {:<22} {}", fraud_type.label(), count);
        }
        println!("{}", style("Findings by risk:").bold());
        for (risk, count) in self.tally.by_risk.iter().rev() {
            println!("  {:<22} {}", risk_style(*risk), count);
        }
    }
}

impl ReportSink for ConsoleSink {
    fn record(&mut self, outcome: &FileOutcome) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
        if !self.verbose {
            return;
        }

        let lines = match outcome {
            FileOutcome::Scanned(report) => format_report(report),
            FileOutcome::Failed { source, error } => vec![format!(
                "{} {}: {}",
                style("✗").red(),
                source,
                style(error).red()
            )],
        };
        self.print(&lines);
    }

    fn update_charts(&mut self, tally: &FindingTally) {
        self.tally = tally.clone();
    }
}

fn risk_style(risk: RiskLevel) -> StyledObject<&'static str> {
    match risk {
        RiskLevel::High => style(risk.as_str()).red().bold(),
        RiskLevel::Medium => style(risk.as_str()).yellow(),
        RiskLevel::Low => style(risk.as_str()).cyan(),
    }
}

/// Plain text rendering of one report.
pub fn format_report(report: &DocumentReport) -> Vec<String> {
    let mut lines = Vec::new();

    if report.is_clean() {
        lines.push(format!("{} {}: no findings", style("✓").green(), report.source));
        return lines;
    }

    lines.push(format!("{} {}", style("!").yellow().bold(), report.source));
    for finding in &report.findings {
        lines.push(format!(
            "  [{}] {}: {}",
            risk_style(finding.risk),
            finding.fraud_type,
            finding.details
        ));
    }
    for failure in &report.rule_errors {
        lines.push(format!(
            "  {} {} could not run: {}",
            style("✗").red(),
            failure.rule,
            failure.message
        ));
    }

    lines
}
