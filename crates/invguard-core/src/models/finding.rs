//! Fraud findings and the records derived from them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type of fraud a rule reports. One variant per rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FraudType {
    #[serde(rename = "Phishing Scam")]
    PhishingScam,
    #[serde(rename = "Overcharging")]
    Overcharging,
    #[serde(rename = "Duplicate Invoice")]
    DuplicateInvoice,
    #[serde(rename = "Altered Invoice")]
    AlteredInvoice,
    #[serde(rename = "Kickback")]
    Kickback,
    #[serde(rename = "Phantom Vendor")]
    PhantomVendor,
    #[serde(rename = "Shell Company")]
    ShellCompany,
    #[serde(rename = "Payroll Fraud")]
    PayrollFraud,
    #[serde(rename = "Cross-Company Fraud")]
    CrossCompanyFraud,
    #[serde(rename = "Advance Payment Scam")]
    AdvancePaymentScam,
}

impl FraudType {
    /// All fraud types in rule registration order.
    pub const ALL: [FraudType; 10] = [
        FraudType::PhishingScam,
        FraudType::Overcharging,
        FraudType::DuplicateInvoice,
        FraudType::AlteredInvoice,
        FraudType::Kickback,
        FraudType::PhantomVendor,
        FraudType::ShellCompany,
        FraudType::PayrollFraud,
        FraudType::CrossCompanyFraud,
        FraudType::AdvancePaymentScam,
    ];

    /// Human readable label, also used as the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            FraudType::PhishingScam => "Phishing Scam",
            FraudType::Overcharging => "Overcharging",
            FraudType::DuplicateInvoice => "Duplicate Invoice",
            FraudType::AlteredInvoice => "Altered Invoice",
            FraudType::Kickback => "Kickback",
            FraudType::PhantomVendor => "Phantom Vendor",
            FraudType::ShellCompany => "Shell Company",
            FraudType::PayrollFraud => "Payroll Fraud",
            FraudType::CrossCompanyFraud => "Cross-Company Fraud",
            FraudType::AdvancePaymentScam => "Advance Payment Scam",
        }
    }

    /// Short machine-friendly key (used in config files and CLI flags).
    pub fn key(&self) -> &'static str {
        match self {
            FraudType::PhishingScam => "phishing",
            FraudType::Overcharging => "overcharging",
            FraudType::DuplicateInvoice => "duplicate",
            FraudType::AlteredInvoice => "altered",
            FraudType::Kickback => "kickback",
            FraudType::PhantomVendor => "phantom_vendor",
            FraudType::ShellCompany => "shell_company",
            FraudType::PayrollFraud => "payroll",
            FraudType::CrossCompanyFraud => "cross_company",
            FraudType::AdvancePaymentScam => "advance_payment",
        }
    }

    /// Look up a fraud type by its key or label (case-insensitive).
    pub fn from_key(s: &str) -> Option<Self> {
        let s = s.trim();
        FraudType::ALL
            .into_iter()
            .find(|t| t.key().eq_ignore_ascii_case(s) || t.label().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for FraudType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity attached to a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fraud-rule match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Which rule produced the finding.
    #[serde(rename = "type")]
    pub fraud_type: FraudType,

    /// Severity of the match.
    pub risk: RiskLevel,

    /// Explanation shown to the reviewer.
    pub details: String,
}

impl Finding {
    pub fn new(fraud_type: FraudType, risk: RiskLevel, details: impl Into<String>) -> Self {
        Self {
            fraud_type,
            risk,
            details: details.into(),
        }
    }
}

/// A rule that could not complete for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFailure {
    /// The rule that failed.
    pub rule: FraudType,

    /// Why it failed.
    pub message: String,
}

/// Everything the scanner learned about one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// File name or other label of the scanned source.
    pub source: String,

    /// Content fingerprint (hex SHA-256).
    pub fingerprint: String,

    /// Findings in rule registration order.
    pub findings: Vec<Finding>,

    /// Rules that could not complete. Empty when every rule ran.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rule_errors: Vec<RuleFailure>,

    /// When the scan finished.
    pub scanned_at: DateTime<Utc>,
}

impl DocumentReport {
    /// True when every rule completed and none matched.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && self.rule_errors.is_empty()
    }

    /// Highest risk among the findings.
    pub fn max_risk(&self) -> Option<RiskLevel> {
        self.findings.iter().map(|f| f.risk).max()
    }

    /// Flatten the findings into export rows.
    pub fn export_records(&self) -> Vec<ExportRecord> {
        self.findings
            .iter()
            .map(|f| ExportRecord {
                file: self.source.clone(),
                fraud_type: f.fraud_type,
                risk: f.risk,
                details: f.details.clone(),
            })
            .collect()
    }
}

/// Flat `{file, type, risk, details}` row for spreadsheet/document writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub file: String,
    #[serde(rename = "type")]
    pub fraud_type: FraudType,
    pub risk: RiskLevel,
    pub details: String,
}

/// Counts of findings by type and by risk level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingTally {
    pub by_type: BTreeMap<FraudType, usize>,
    pub by_risk: BTreeMap<RiskLevel, usize>,
}

impl FindingTally {
    /// Tally a set of findings.
    pub fn from_findings<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Self {
        let mut tally = Self::default();
        tally.extend(findings);
        tally
    }

    /// Add more findings to the tally.
    pub fn extend<'a>(&mut self, findings: impl IntoIterator<Item = &'a Finding>) {
        for finding in findings {
            *self.by_type.entry(finding.fraud_type).or_default() += 1;
            *self.by_risk.entry(finding.risk).or_default() += 1;
        }
    }

    /// Total number of findings counted.
    pub fn total(&self) -> usize {
        self.by_type.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_finding_serializes_with_labels() {
        let finding = Finding::new(FraudType::PhishingScam, RiskLevel::High, "urgent wording");
        let json = serde_json::to_value(&finding).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "Phishing Scam",
                "risk": "high",
                "details": "urgent wording",
            })
        );
    }

    #[test]
    fn test_fraud_type_lookup() {
        assert_eq!(FraudType::from_key("phishing"), Some(FraudType::PhishingScam));
        assert_eq!(FraudType::from_key("Shell Company"), Some(FraudType::ShellCompany));
        assert_eq!(FraudType::from_key("CROSS_COMPANY"), Some(FraudType::CrossCompanyFraud));
        assert_eq!(FraudType::from_key("embezzlement"), None);
    }

    #[test]
    fn test_tally_counts() {
        let findings = vec![
            Finding::new(FraudType::PhishingScam, RiskLevel::High, ""),
            Finding::new(FraudType::Kickback, RiskLevel::Medium, ""),
            Finding::new(FraudType::PhishingScam, RiskLevel::High, ""),
        ];

        let tally = FindingTally::from_findings(&findings);

        assert_eq!(tally.total(), 3);
        assert_eq!(tally.by_type[&FraudType::PhishingScam], 2);
        assert_eq!(tally.by_risk[&RiskLevel::Medium], 1);
        assert!(!tally.by_risk.contains_key(&RiskLevel::Low));
    }
}
