//! Collects per-rule results for one document.

use tracing::trace;

use crate::evaluator::RuleResult;
use crate::models::finding::{Finding, RuleFailure};
use crate::registry::RegistryUpdate;

/// Findings, failures and pending registry updates of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Findings in rule registration order.
    pub findings: Vec<Finding>,
    /// Rules that could not complete.
    pub failures: Vec<RuleFailure>,
    /// Registry updates to commit, in rule registration order.
    pub updates: Vec<RegistryUpdate>,
}

/// Merge rule results, keeping their order and dropping empty outcomes.
///
/// A failed rule contributes neither a finding nor updates.
pub fn aggregate(results: Vec<RuleResult>) -> Aggregation {
    let mut aggregation = Aggregation::default();

    for RuleResult { rule, outcome } in results {
        match outcome {
            Ok(outcome) => {
                if let Some(finding) = outcome.finding {
                    debug_assert_eq!(finding.fraud_type, rule, "finding reported by the wrong rule");
                    trace!("{} -> {} risk", rule, finding.risk);
                    aggregation.findings.push(finding);
                }
                aggregation.updates.extend(outcome.updates);
            }
            Err(e) => aggregation.failures.push(RuleFailure {
                rule,
                message: e.to_string(),
            }),
        }
    }

    aggregation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PriceError, RuleError};
    use crate::models::finding::{FraudType, RiskLevel};
    use crate::rules::RuleOutcome;
    use pretty_assertions::assert_eq;

    fn found(rule: FraudType, risk: RiskLevel) -> RuleResult {
        RuleResult {
            rule,
            outcome: Ok(RuleOutcome::found(Finding::new(rule, risk, "x"))),
        }
    }

    #[test]
    fn test_keeps_order_and_separates_failures() {
        let results = vec![
            found(FraudType::PhishingScam, RiskLevel::High),
            RuleResult {
                rule: FraudType::Overcharging,
                outcome: Err(RuleError::PriceSource(PriceError::Unavailable("down".into()))),
            },
            RuleResult {
                rule: FraudType::DuplicateInvoice,
                outcome: Ok(RuleOutcome::clean().with_updates(vec![RegistryUpdate::Fingerprint {
                    fingerprint: "f".into(),
                    source: "a.pdf".into(),
                }])),
            },
            found(FraudType::Kickback, RiskLevel::Medium),
        ];

        let aggregation = aggregate(results);

        let types: Vec<FraudType> = aggregation.findings.iter().map(|f| f.fraud_type).collect();
        assert_eq!(types, vec![FraudType::PhishingScam, FraudType::Kickback]);
        assert_eq!(
            aggregation.failures,
            vec![RuleFailure {
                rule: FraudType::Overcharging,
                message: "market prices unavailable: down".to_string(),
            }]
        );
        assert_eq!(aggregation.updates.len(), 1);
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(aggregate(Vec::new()), Aggregation::default());
    }
}
