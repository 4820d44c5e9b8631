//! Keyword co-occurrence rules (phishing, kickback, advance payment scams).

use regex::Regex;
use tracing::debug;

use super::{RuleContext, RuleOutcome};
use crate::models::finding::{Finding, FraudType, RiskLevel};

/// A set of keyword classes that must all appear in the same content.
///
/// Order and distance between the keywords do not matter.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    label: &'static str,
    classes: Vec<&'static Regex>,
}

impl KeywordSet {
    pub fn new(label: &'static str, classes: &[&'static Regex]) -> Self {
        Self {
            label,
            classes: classes.to_vec(),
        }
    }

    /// Human readable list of the keyword classes.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// True when every class matches somewhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        !self.classes.is_empty() && self.classes.iter().all(|class| class.is_match(text))
    }
}

fn check(ctx: &RuleContext<'_>, set: &KeywordSet, finding: impl FnOnce() -> Finding) -> RuleOutcome {
    if set.is_match(ctx.text) {
        debug!("{}: matched keyword set [{}]", ctx.source, set.label());
        RuleOutcome::found(finding())
    } else {
        RuleOutcome::clean()
    }
}

pub fn check_phishing(ctx: &RuleContext<'_>) -> RuleOutcome {
    check(ctx, ctx.registry.phishing(), || {
        Finding::new(
            FraudType::PhishingScam,
            RiskLevel::High,
            "Urgent payment demand tied to an invoice; verify the request through a known contact",
        )
    })
}

pub fn check_kickback(ctx: &RuleContext<'_>) -> RuleOutcome {
    check(ctx, ctx.registry.kickback(), || {
        Finding::new(
            FraudType::Kickback,
            RiskLevel::Medium,
            "Referral commission terms found in a billing document",
        )
    })
}

pub fn check_advance_payment(ctx: &RuleContext<'_>) -> RuleOutcome {
    check(ctx, ctx.registry.advance_payment(), || {
        Finding::new(
            FraudType::AdvancePaymentScam,
            RiskLevel::High,
            "Advance payment is demanded before goods or services are delivered",
        )
    })
}
