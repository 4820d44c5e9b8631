//! Document scanning pipeline: extract, evaluate, aggregate, commit.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::aggregator::aggregate;
use crate::error::Result;
use crate::evaluator::FraudEvaluator;
use crate::extract::{ContentExtractor, ExtractedContent, FormatExtractor};
use crate::models::config::{InvguardConfig, PriceConfig};
use crate::models::finding::{DocumentReport, FindingTally};
use crate::prices::{JsonFilePriceSource, PriceSource, PriceTable, StaticPriceSource};
use crate::registry::{PatternRegistry, RegistryStats};
use crate::report::{BatchSummary, FileOutcome, ReportSink};
use crate::rules::duplicate::fingerprint;

/// Scans documents one at a time against a session registry.
pub struct FraudScanner {
    extractor: Box<dyn ContentExtractor>,
    evaluator: FraudEvaluator,
    registry: PatternRegistry,
}

impl FraudScanner {
    /// Create a scanner with the default extractor and the configured price
    /// reference.
    pub fn new(config: &InvguardConfig) -> Self {
        let evaluator = FraudEvaluator::from_config(&config.rules)
            .with_price_source(price_source_from_config(&config.prices));

        Self {
            extractor: Box::new(FormatExtractor::new(config.extraction.clone())),
            evaluator,
            registry: PatternRegistry::from_config(&config.rules),
        }
    }

    /// Replace the content extractor.
    pub fn with_extractor(mut self, extractor: Box<dyn ContentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the market price source.
    pub fn with_price_source(mut self, prices: Arc<dyn PriceSource>) -> Self {
        self.evaluator = self.evaluator.with_price_source(prices);
        self
    }

    /// Read, extract and scan a file.
    pub async fn process_file(&mut self, path: &Path) -> Result<DocumentReport> {
        let data = std::fs::read(path)?;
        self.process_bytes(&path.display().to_string(), &data).await
    }

    /// Extract and scan an in-memory document. The format is taken from the
    /// extension of `name`.
    pub async fn process_bytes(&mut self, name: &str, data: &[u8]) -> Result<DocumentReport> {
        let content = self.extractor.extract(name, data)?;
        Ok(self.process_content(name, content).await)
    }

    /// Scan already extracted content.
    ///
    /// Every rule sees the registry as it was before this document. Registry
    /// updates are committed once all rules have finished.
    pub async fn process_content(&mut self, source: &str, content: ExtractedContent) -> DocumentReport {
        let start = Utc::now();
        let fingerprint = fingerprint(&content.as_text());

        let results = self
            .evaluator
            .evaluate(source, &content, &fingerprint, &self.registry)
            .await;
        let aggregation = aggregate(results);
        self.registry.commit(aggregation.updates);

        info!(
            "Scanned {}: {} findings, {} rule errors in {}ms",
            source,
            aggregation.findings.len(),
            aggregation.failures.len(),
            (Utc::now() - start).num_milliseconds()
        );

        DocumentReport {
            source: source.to_string(),
            fingerprint,
            findings: aggregation.findings,
            rule_errors: aggregation.failures,
            scanned_at: Utc::now(),
        }
    }

    /// Scan files strictly in the given order.
    ///
    /// A file that cannot be read or extracted is recorded as
    /// [`FileOutcome::Failed`] and the batch moves on.
    pub async fn process_batch<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        sink: &mut dyn ReportSink,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for path in paths {
            let path = path.as_ref();
            let outcome = match self.process_file(path).await {
                Ok(report) => {
                    summary.tally.extend(&report.findings);
                    FileOutcome::Scanned(report)
                }
                Err(e) => {
                    warn!("Failed to scan {}: {}", path.display(), e);
                    FileOutcome::Failed {
                        source: path.display().to_string(),
                        error: e.to_string(),
                    }
                }
            };

            sink.record(&outcome);
            if !outcome.is_failed() {
                sink.update_charts(&summary.tally);
            }
            summary.outcomes.push(outcome);
        }

        info!(
            "Batch finished: {} scanned, {} failed, {} findings",
            summary.scanned(),
            summary.failed(),
            summary.tally.total()
        );

        summary
    }

    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Start a new session: forget earlier documents.
    pub fn reset(&mut self) {
        self.registry.reset();
    }

    /// Tally of a report list, for callers that keep their own.
    pub fn tally(reports: &[DocumentReport]) -> FindingTally {
        FindingTally::from_findings(reports.iter().flat_map(|r| &r.findings))
    }
}

impl Default for FraudScanner {
    fn default() -> Self {
        Self::new(&InvguardConfig::default())
    }
}

fn price_source_from_config(config: &PriceConfig) -> Arc<dyn PriceSource> {
    if let Some(path) = &config.file {
        debug!("Using market prices from {}", path.display());
        return Arc::new(JsonFilePriceSource::new(path));
    }

    if !config.table.is_empty() {
        debug!("Using {} configured market prices", config.table.len());
        return Arc::new(StaticPriceSource::new(config.table.iter().map(|(k, v)| (k, *v)).collect()));
    }

    if config.url.is_some() {
        warn!("Price URL configured but no HTTP price source was supplied; overcharging cannot flag");
    } else {
        warn!("No market price reference configured; overcharging cannot flag");
    }
    Arc::new(StaticPriceSource::new(PriceTable::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractError, PriceError, ScanError};
    use crate::models::finding::{FraudType, RiskLevel};
    use crate::report::MemorySink;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    struct OfflinePrices;

    #[async_trait]
    impl PriceSource for OfflinePrices {
        async fn market_prices(&self) -> std::result::Result<PriceTable, PriceError> {
            Err(PriceError::Unavailable("timeout".to_string()))
        }
    }

    fn types(report: &DocumentReport) -> Vec<FraudType> {
        report.findings.iter().map(|f| f.fraud_type).collect()
    }

    #[tokio::test]
    async fn test_phishing_scenario() {
        let mut scanner = FraudScanner::default();
        let report = scanner
            .process_content(
                "mail.docx",
                ExtractedContent::Text("URGENT: invoice payment required immediately".into()),
            )
            .await;

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].fraud_type, FraudType::PhishingScam);
        assert_eq!(report.findings[0].risk, RiskLevel::High);
        assert!(report.rule_errors.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "urgent invoice payment").unwrap();

        let mut scanner = FraudScanner::default();
        let err = scanner.process_file(&path).await.unwrap_err();
        assert!(err.is_unsupported_format());
        assert!(matches!(
            err,
            ScanError::Extract(ExtractError::UnsupportedFormat(ext)) if ext == "txt"
        ));
        assert_eq!(scanner.stats().documents, 0);
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("notes.txt");
        let good = dir.path().join("invoice.csv");
        let copy = dir.path().join("invoice-copy.csv");
        std::fs::write(&bad, "whatever").unwrap();
        std::fs::write(&good, "Vendor,Item,Price\nShell Corp Ltd,Consulting,900\n").unwrap();
        std::fs::write(&copy, "Vendor,Item,Price\nShell Corp Ltd,Consulting,900\n").unwrap();

        let mut scanner = FraudScanner::default();
        let mut sink = MemorySink::default();
        let paths = vec![bad, good, dir.path().join("missing.pdf"), copy];
        let summary = scanner.process_batch(&paths, &mut sink).await;

        assert_eq!(summary.outcomes.len(), 4);
        assert_eq!(summary.failed(), 2);
        assert_eq!(summary.scanned(), 2);
        assert!(summary.outcomes[0].is_failed());
        assert!(summary.outcomes[2].is_failed());

        let first = summary.outcomes[1].report().unwrap();
        assert_eq!(types(first), vec![FraudType::ShellCompany]);

        let second = summary.outcomes[3].report().unwrap();
        assert_eq!(types(second), vec![FraudType::DuplicateInvoice, FraudType::ShellCompany]);

        assert_eq!(sink.outcomes.len(), 4);
        assert_eq!(sink.chart_updates, 2);
        assert_eq!(sink.tally.total(), 3);
        assert_eq!(summary.tally.by_type.get(&FraudType::ShellCompany), Some(&2));
    }

    #[tokio::test]
    async fn test_first_submission_never_self_flags() {
        let mut scanner = FraudScanner::default();
        let content = ExtractedContent::Text("Vendor: Acme\nIBAN: DE89370400440532013000\n".into());

        let first = scanner.process_content("a.pdf", content.clone()).await;
        assert!(first.is_clean());

        let second = scanner.process_content("b.pdf", content).await;
        assert_eq!(types(&second), vec![FraudType::DuplicateInvoice]);
    }

    #[tokio::test]
    async fn test_price_failure_only_affects_overcharging() {
        let mut scanner = FraudScanner::default().with_price_source(Arc::new(OfflinePrices));
        let text = "Vendor: Shell Corp Ltd\nURGENT invoice, payment due\nDesk: 900\n";

        let report = scanner
            .process_content("a.pdf", ExtractedContent::Text(text.into()))
            .await;

        assert_eq!(types(&report), vec![FraudType::PhishingScam, FraudType::ShellCompany]);
        assert_eq!(report.rule_errors.len(), 1);
        assert_eq!(report.rule_errors[0].rule, FraudType::Overcharging);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_overcharging_from_config_table() {
        let mut config = InvguardConfig::default();
        config.prices.table = BTreeMap::from([("Desk".to_string(), Decimal::new(200, 0))]);
        let mut scanner = FraudScanner::new(&config);

        let report = scanner
            .process_content("a.pdf", ExtractedContent::Text("Desk: 450\n".into()))
            .await;
        assert_eq!(types(&report), vec![FraudType::Overcharging]);
    }

    #[tokio::test]
    async fn test_stateless_rules_idempotent_across_sessions() {
        let content = ExtractedContent::Text("Referral commission included with this invoice".into());

        let mut first = FraudScanner::default();
        let mut second = FraudScanner::default();
        let a = first.process_content("a.pdf", content.clone()).await;
        let b = second.process_content("a.pdf", content).await;

        assert_eq!(a.findings, b.findings);
        assert_eq!(types(&a), vec![FraudType::Kickback]);
    }

    #[tokio::test]
    async fn test_reset_starts_a_new_session() {
        let mut scanner = FraudScanner::default();
        let content = ExtractedContent::Text("Invoice 7 for services".into());

        scanner.process_content("a.pdf", content.clone()).await;
        scanner.reset();
        let report = scanner.process_content("b.pdf", content).await;

        assert!(report.is_clean());
        assert_eq!(scanner.stats().documents, 1);
        assert_eq!(scanner.stats().known_bad, 3);
    }
}
