//! Per-file outcomes and the reporting seam.

use serde::{Deserialize, Serialize};

use crate::models::finding::{DocumentReport, FindingTally};

/// Result of scanning one file in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// The file was extracted and every enabled rule was run.
    Scanned(DocumentReport),
    /// The file could not be read; no rule was run.
    Failed { source: String, error: String },
}

impl FileOutcome {
    pub fn source(&self) -> &str {
        match self {
            FileOutcome::Scanned(report) => &report.source,
            FileOutcome::Failed { source, .. } => source,
        }
    }

    pub fn report(&self) -> Option<&DocumentReport> {
        match self {
            FileOutcome::Scanned(report) => Some(report),
            FileOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FileOutcome::Failed { .. })
    }
}

/// Receives scan results as they are produced.
pub trait ReportSink {
    /// Called once per file, in submission order.
    fn record(&mut self, outcome: &FileOutcome);

    /// Called with the running tally after each scanned file.
    fn update_charts(&mut self, _tally: &FindingTally) {}
}

/// Sink that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub outcomes: Vec<FileOutcome>,
    pub tally: FindingTally,
    pub chart_updates: usize,
}

impl ReportSink for MemorySink {
    fn record(&mut self, outcome: &FileOutcome) {
        self.outcomes.push(outcome.clone());
    }

    fn update_charts(&mut self, tally: &FindingTally) {
        self.tally = tally.clone();
        self.chart_updates += 1;
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn record(&mut self, _outcome: &FileOutcome) {}
}

/// Outcome of a batch scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// One entry per input, in submission order.
    pub outcomes: Vec<FileOutcome>,
    /// Findings across all scanned files.
    pub tally: FindingTally,
}

impl BatchSummary {
    pub fn scanned(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_failed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    /// Scanned files with at least one finding.
    pub fn flagged(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(FileOutcome::report)
            .filter(|r| !r.findings.is_empty())
            .count()
    }
}
