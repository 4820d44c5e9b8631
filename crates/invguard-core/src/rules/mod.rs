//! Fraud rules.
//!
//! Every rule is identified by its [`FraudType`] and described in [`RULES`]
//! in registration order. A rule reads the document and a shared borrow of
//! the [`PatternRegistry`], and answers with at most one finding plus the
//! registry updates it wants committed.

pub mod duplicate;
pub mod entities;
pub mod keywords;
pub mod overcharge;
pub mod patterns;

pub use entities::{extract_parties, normalize_account, normalize_identifier, PartyRef};
pub use keywords::KeywordSet;
pub use overcharge::{extract_line_items, parse_price, LineItem};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::RuleError;
use crate::extract::ExtractedContent;
use crate::models::finding::{Finding, FraudType};
use crate::prices::PriceSource;
use crate::registry::{PatternRegistry, RegistryUpdate};

/// Result type for rule evaluation.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Whether a rule has detection logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    /// The rule runs and may report findings.
    Active,
    /// Placeholder with no detection logic yet; never reports.
    Reserved,
}

/// Static description of a rule.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RuleDescriptor {
    pub fraud_type: FraudType,
    pub status: RuleStatus,
    /// Whether the outcome depends on earlier documents of the session.
    pub stateful: bool,
    pub description: &'static str,
}

/// All rules, in registration order.
pub static RULES: [RuleDescriptor; 10] = [
    RuleDescriptor {
        fraud_type: FraudType::PhishingScam,
        status: RuleStatus::Active,
        stateful: false,
        description: "invoice, urgency and payment language in the same document",
    },
    RuleDescriptor {
        fraud_type: FraudType::Overcharging,
        status: RuleStatus::Active,
        stateful: false,
        description: "line item priced above the allowed multiple of its market price",
    },
    RuleDescriptor {
        fraud_type: FraudType::DuplicateInvoice,
        status: RuleStatus::Active,
        stateful: true,
        description: "content identical to a document already scanned this session",
    },
    RuleDescriptor {
        fraud_type: FraudType::AlteredInvoice,
        status: RuleStatus::Reserved,
        stateful: false,
        description: "no detection logic defined",
    },
    RuleDescriptor {
        fraud_type: FraudType::Kickback,
        status: RuleStatus::Active,
        stateful: false,
        description: "referral and commission language in the same document",
    },
    RuleDescriptor {
        fraud_type: FraudType::PhantomVendor,
        status: RuleStatus::Active,
        stateful: true,
        description: "known vendor paid to an account never used for it before",
    },
    RuleDescriptor {
        fraud_type: FraudType::ShellCompany,
        status: RuleStatus::Active,
        stateful: false,
        description: "vendor on the known shell company list",
    },
    RuleDescriptor {
        fraud_type: FraudType::PayrollFraud,
        status: RuleStatus::Reserved,
        stateful: false,
        description: "no detection logic defined",
    },
    RuleDescriptor {
        fraud_type: FraudType::CrossCompanyFraud,
        status: RuleStatus::Active,
        stateful: true,
        description: "payment account already used by a different company",
    },
    RuleDescriptor {
        fraud_type: FraudType::AdvancePaymentScam,
        status: RuleStatus::Active,
        stateful: false,
        description: "advance, payment and required language in the same document",
    },
];

/// Look up the descriptor of a rule. `RULES` is in `FraudType` order.
pub fn descriptor(fraud_type: FraudType) -> &'static RuleDescriptor {
    &RULES[fraud_type as usize]
}

/// Everything a rule may look at for one document.
pub struct RuleContext<'a> {
    /// Source label of the document.
    pub source: &'a str,
    /// Extracted content.
    pub content: &'a ExtractedContent,
    /// Text view of the content.
    pub text: &'a str,
    /// Content fingerprint.
    pub fingerprint: &'a str,
    /// Registry state as of before this document.
    pub registry: &'a PatternRegistry,
    /// Market price reference.
    pub prices: &'a dyn PriceSource,
    /// Overcharge threshold as a multiple of the market price.
    pub overcharge_ratio: Decimal,
}

/// What one rule produced for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleOutcome {
    pub finding: Option<Finding>,
    pub updates: Vec<RegistryUpdate>,
}

impl RuleOutcome {
    /// No finding and nothing to remember.
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn found(finding: Finding) -> Self {
        Self {
            finding: Some(finding),
            updates: Vec::new(),
        }
    }

    pub fn with_updates(mut self, updates: Vec<RegistryUpdate>) -> Self {
        self.updates = updates;
        self
    }
}

/// Run one rule against a document.
pub async fn evaluate_rule(fraud_type: FraudType, ctx: &RuleContext<'_>) -> Result<RuleOutcome> {
    match fraud_type {
        FraudType::PhishingScam => Ok(keywords::check_phishing(ctx)),
        FraudType::Overcharging => overcharge::check_overcharging(ctx).await,
        FraudType::DuplicateInvoice => Ok(duplicate::check_duplicate(ctx)),
        FraudType::Kickback => Ok(keywords::check_kickback(ctx)),
        FraudType::PhantomVendor => Ok(entities::check_phantom_vendor(ctx)),
        FraudType::ShellCompany => Ok(entities::check_shell_company(ctx)),
        FraudType::CrossCompanyFraud => Ok(entities::check_cross_company(ctx)),
        FraudType::AdvancePaymentScam => Ok(keywords::check_advance_payment(ctx)),
        FraudType::AlteredInvoice | FraudType::PayrollFraud => Ok(RuleOutcome::clean()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::prices::{PriceTable, StaticPriceSource};

    /// Owns everything a [`RuleContext`] borrows.
    pub struct Fixture {
        pub source: String,
        pub content: ExtractedContent,
        pub text: String,
        pub fingerprint: String,
        pub prices: StaticPriceSource,
    }

    impl Fixture {
        pub fn text(source: &str, text: &str) -> Self {
            Self::content(source, ExtractedContent::Text(text.to_string()))
        }

        pub fn content(source: &str, content: ExtractedContent) -> Self {
            let text = content.as_text();
            Self {
                source: source.to_string(),
                fingerprint: crate::fingerprint(&text),
                text,
                content,
                prices: StaticPriceSource::new(PriceTable::default()),
            }
        }

        pub fn ctx<'a>(&'a self, registry: &'a PatternRegistry) -> RuleContext<'a> {
            RuleContext {
                source: &self.source,
                content: &self.content,
                text: &self.text,
                fingerprint: &self.fingerprint,
                registry,
                prices: &self.prices,
                overcharge_ratio: Decimal::new(15, 1),
            }
        }
    }
}
