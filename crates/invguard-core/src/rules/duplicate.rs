//! Duplicate submission detection by content fingerprint.

use sha2::{Digest, Sha256};
use tracing::debug;

use super::{RuleContext, RuleOutcome};
use crate::models::finding::{Finding, FraudType, RiskLevel};
use crate::registry::RegistryUpdate;

/// Hex SHA-256 of the text view of a document.
pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

pub fn check_duplicate(ctx: &RuleContext<'_>) -> RuleOutcome {
    // Blank documents all hash alike; they are not duplicates of each other
    if ctx.content.is_blank() {
        return RuleOutcome::clean();
    }

    let remember = vec![RegistryUpdate::Fingerprint {
        fingerprint: ctx.fingerprint.to_string(),
        source: ctx.source.to_string(),
    }];

    match ctx.registry.first_seen(ctx.fingerprint) {
        Some(original) => {
            debug!(
                "{}: fingerprint {} first seen in {}",
                ctx.source, ctx.fingerprint, original.source
            );
            RuleOutcome::found(Finding::new(
                FraudType::DuplicateInvoice,
                RiskLevel::High,
                format!(
                    "Identical content was already submitted as '{}' (document #{})",
                    original.source,
                    original.sequence + 1
                ),
            ))
            .with_updates(remember)
        }
        None => RuleOutcome::clean().with_updates(remember),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractedContent;
    use crate::registry::PatternRegistry;
    use crate::rules::test_support::Fixture;

    fn run(registry: &mut PatternRegistry, fixture: &Fixture) -> Option<Finding> {
        let outcome = check_duplicate(&fixture.ctx(registry));
        registry.commit(outcome.updates);
        outcome.finding
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let fp = fingerprint("invoice 1");
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, fingerprint("invoice 1"));
        assert_ne!(fp, fingerprint("invoice 2"));
    }

    #[test]
    fn test_second_submission_is_flagged() {
        let mut registry = PatternRegistry::default();
        let first = Fixture::text("a.pdf", "Invoice 1001 total 500.00");
        let second = Fixture::text("b.pdf", "Invoice 1001 total 500.00");

        assert!(run(&mut registry, &first).is_none());

        let finding = run(&mut registry, &second).unwrap();
        assert_eq!(finding.risk, RiskLevel::High);
        assert!(finding.details.contains("'a.pdf'"));
    }

    #[test]
    fn test_different_content_never_cross_flags() {
        let mut registry = PatternRegistry::default();
        assert!(run(&mut registry, &Fixture::text("a.pdf", "Invoice 1001")).is_none());
        assert!(run(&mut registry, &Fixture::text("b.pdf", "Invoice 1002")).is_none());
        assert!(run(&mut registry, &Fixture::text("c.pdf", "invoice 1001")).is_none());
    }

    #[test]
    fn test_order_decides_which_copy_flags() {
        let a = Fixture::text("a.pdf", "same body");
        let b = Fixture::text("b.pdf", "same body");

        let mut registry = PatternRegistry::default();
        assert!(run(&mut registry, &a).is_none());
        assert!(run(&mut registry, &b).unwrap().details.contains("'a.pdf'"));

        registry.reset();
        assert!(run(&mut registry, &b).is_none());
        assert!(run(&mut registry, &a).unwrap().details.contains("'b.pdf'"));
    }

    #[test]
    fn test_blank_documents_are_ignored() {
        let mut registry = PatternRegistry::default();
        let blank = Fixture::content("a.xlsx", ExtractedContent::Rows(vec![vec![String::new()]]));
        assert!(run(&mut registry, &blank).is_none());
        assert!(run(&mut registry, &blank).is_none());
        assert_eq!(registry.stats().fingerprints, 0);
    }
}
