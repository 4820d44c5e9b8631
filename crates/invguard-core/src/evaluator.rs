//! Fan-out of the fraud rules over one document.

use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::RuleError;
use crate::extract::ExtractedContent;
use crate::models::config::RuleConfig;
use crate::models::finding::FraudType;
use crate::prices::{PriceSource, PriceTable, StaticPriceSource};
use crate::registry::PatternRegistry;
use crate::rules::{evaluate_rule, RuleContext, RuleOutcome, RULES};

/// What one rule produced for one document, or why it could not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    pub rule: FraudType,
    pub outcome: Result<RuleOutcome, RuleError>,
}

/// Runs the enabled rules concurrently against a registry snapshot.
pub struct FraudEvaluator {
    /// Enabled rules in registration order.
    rules: Vec<FraudType>,
    prices: Arc<dyn PriceSource>,
    overcharge_ratio: Decimal,
}

impl FraudEvaluator {
    /// Create an evaluator running every rule, with an empty price table.
    pub fn new() -> Self {
        Self::from_config(&RuleConfig::default())
    }

    /// Create an evaluator from rule configuration.
    pub fn from_config(config: &RuleConfig) -> Self {
        let disabled = config.disabled_types();
        for name in &config.disabled {
            if FraudType::from_key(name).is_none() {
                warn!("Ignoring unknown rule in disabled list: {}", name);
            }
        }

        let rules: Vec<FraudType> = RULES
            .iter()
            .map(|rule| rule.fraud_type)
            .filter(|fraud_type| !disabled.contains(fraud_type))
            .collect();

        debug!("Evaluator running {} of {} rules", rules.len(), RULES.len());

        Self {
            rules,
            prices: Arc::new(StaticPriceSource::new(PriceTable::new())),
            overcharge_ratio: config.overcharge_ratio,
        }
    }

    /// Set the market price source used by the overcharging rule.
    pub fn with_price_source(mut self, prices: Arc<dyn PriceSource>) -> Self {
        self.prices = prices;
        self
    }

    /// Set the overcharge threshold.
    pub fn with_overcharge_ratio(mut self, ratio: Decimal) -> Self {
        self.overcharge_ratio = ratio;
        self
    }

    /// Enabled rules in registration order.
    pub fn rules(&self) -> &[FraudType] {
        &self.rules
    }

    /// Run every enabled rule against the document.
    ///
    /// Rules only read `registry`; their updates are returned, not applied.
    /// Results come back in registration order whatever order the futures
    /// complete in.
    pub async fn evaluate(
        &self,
        source: &str,
        content: &ExtractedContent,
        fingerprint: &str,
        registry: &PatternRegistry,
    ) -> Vec<RuleResult> {
        let text = content.as_text();
        let ctx = RuleContext {
            source,
            content,
            text: &text,
            fingerprint,
            registry,
            prices: self.prices.as_ref(),
            overcharge_ratio: self.overcharge_ratio,
        };

        let ctx = &ctx;
        join_all(self.rules.iter().map(|&rule| async move {
            let outcome = evaluate_rule(rule, ctx).await;
            if let Err(e) = &outcome {
                warn!("{}: rule '{}' failed: {}", source, rule, e);
            }
            RuleResult { rule, outcome }
        }))
        .await
    }
}

impl Default for FraudEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
