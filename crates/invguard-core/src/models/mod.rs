//! Data models shared across the scanning pipeline.

pub mod config;
pub mod finding;

pub use config::{ExtractionConfig, InvguardConfig, PriceConfig, RuleConfig};
pub use finding::{
    DocumentReport, ExportRecord, Finding, FindingTally, FraudType, RiskLevel, RuleFailure,
};
