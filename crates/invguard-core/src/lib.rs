//! Core library for invoice fraud screening.
//!
//! This crate provides:
//! - Content extraction from PDF, XLSX, CSV and DOCX documents
//! - A fixed battery of fraud rules run concurrently per document
//! - Session memory for duplicate and cross-entity checks
//! - Per-document reports, batch outcomes and finding tallies

pub mod aggregator;
pub mod error;
pub mod evaluator;
pub mod extract;
pub mod models;
pub mod prices;
pub mod registry;
pub mod report;
pub mod rules;
pub mod scanner;

pub use error::{ExtractError, PriceError, Result, RuleError, ScanError};
pub use evaluator::{FraudEvaluator, RuleResult};
pub use extract::{ContentExtractor, DocumentFormat, ExtractedContent, FormatExtractor};
pub use models::{
    DocumentReport, ExportRecord, Finding, FindingTally, FraudType, InvguardConfig, RiskLevel,
    RuleFailure,
};
pub use prices::{JsonFilePriceSource, PriceSource, PriceTable, StaticPriceSource};
pub use registry::{PatternRegistry, RegistryStats, RegistryUpdate};
pub use report::{BatchSummary, FileOutcome, MemorySink, NullSink, ReportSink};
pub use rules::duplicate::fingerprint;
pub use rules::{RuleDescriptor, RuleStatus, RULES};
pub use scanner::FraudScanner;
