//! Session state shared by the fraud rules.
//!
//! The registry owns the compiled keyword sets, the fixed known-bad vendor
//! list and the running maps that give the stateful rules their memory
//! (content fingerprints, vendor accounts, account owners). Rules only ever
//! read it; what they learn comes back as [`RegistryUpdate`]s that the scanner
//! commits once every rule for the document has finished.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, trace};

use crate::models::config::RuleConfig;
use crate::rules::entities::{normalize_account, normalize_identifier};
use crate::rules::keywords::KeywordSet;
use crate::rules::patterns::*;

/// First document seen with a given fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeenDocument {
    /// Source label of the document.
    pub source: String,
    /// Zero-based position of the document in the session.
    pub sequence: usize,
}

/// A deferred registry mutation produced by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryUpdate {
    /// Remember a content fingerprint.
    Fingerprint { fingerprint: String, source: String },
    /// Remember a vendor, and the account it was paid to if known.
    VendorAccount { vendor: String, account: Option<String> },
    /// Remember which company used a payment account.
    AccountOwner { account: String, company: String },
}

/// Size of the running maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub documents: usize,
    pub fingerprints: usize,
    pub vendors: usize,
    pub accounts: usize,
    pub known_bad: usize,
}

/// Fraud signatures and cross-document memory for one session.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    phishing: KeywordSet,
    kickback: KeywordSet,
    advance_payment: KeywordSet,
    known_bad: HashSet<String>,
    fingerprints: HashMap<String, SeenDocument>,
    vendor_accounts: HashMap<String, BTreeSet<String>>,
    account_owners: HashMap<String, BTreeSet<String>>,
    documents: usize,
}

impl PatternRegistry {
    /// Create a registry with the given known-bad vendor names.
    pub fn new<I, S>(known_bad: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let known_bad: HashSet<String> = known_bad
            .into_iter()
            .map(|name| normalize_identifier(name.as_ref()))
            .filter(|name| !name.is_empty())
            .collect();

        debug!("Pattern registry initialized with {} known-bad vendors", known_bad.len());

        Self {
            phishing: KeywordSet::new(
                "invoice + urgent + payment",
                &[&*KW_INVOICE, &*KW_URGENT, &*KW_PAYMENT],
            ),
            kickback: KeywordSet::new(
                "referral + commission",
                &[&*KW_REFERRAL, &*KW_COMMISSION],
            ),
            advance_payment: KeywordSet::new(
                "advance + payment + required",
                &[&*KW_ADVANCE, &*KW_PAYMENT, &*KW_REQUIRED],
            ),
            known_bad,
            fingerprints: HashMap::new(),
            vendor_accounts: HashMap::new(),
            account_owners: HashMap::new(),
            documents: 0,
        }
    }

    /// Create a registry from rule configuration.
    pub fn from_config(config: &RuleConfig) -> Self {
        Self::new(&config.known_bad_vendors)
    }

    pub fn phishing(&self) -> &KeywordSet {
        &self.phishing
    }

    pub fn kickback(&self) -> &KeywordSet {
        &self.kickback
    }

    pub fn advance_payment(&self) -> &KeywordSet {
        &self.advance_payment
    }

    /// Whether a vendor name is on the known-bad list.
    pub fn is_known_bad(&self, vendor: &str) -> bool {
        self.known_bad.contains(&normalize_identifier(vendor))
    }

    /// The first document that carried a fingerprint.
    pub fn first_seen(&self, fingerprint: &str) -> Option<&SeenDocument> {
        self.fingerprints.get(fingerprint)
    }

    /// Accounts a vendor has been paid to so far. `None` if the vendor is new.
    pub fn vendor_accounts(&self, vendor: &str) -> Option<&BTreeSet<String>> {
        self.vendor_accounts.get(&normalize_identifier(vendor))
    }

    /// Companies that have used an account so far.
    pub fn account_owners(&self, account: &str) -> Option<&BTreeSet<String>> {
        self.account_owners.get(&normalize_account(account))
    }

    /// Number of documents committed in this session.
    pub fn documents_seen(&self) -> usize {
        self.documents
    }

    /// Apply the updates produced while evaluating one document.
    pub fn commit(&mut self, updates: impl IntoIterator<Item = RegistryUpdate>) {
        let sequence = self.documents;

        for update in updates {
            trace!("Committing {:?}", update);
            match update {
                RegistryUpdate::Fingerprint { fingerprint, source } => {
                    self.fingerprints
                        .entry(fingerprint)
                        .or_insert(SeenDocument { source, sequence });
                }
                RegistryUpdate::VendorAccount { vendor, account } => {
                    let accounts = self
                        .vendor_accounts
                        .entry(normalize_identifier(&vendor))
                        .or_default();
                    if let Some(account) = account {
                        accounts.insert(normalize_account(&account));
                    }
                }
                RegistryUpdate::AccountOwner { account, company } => {
                    self.account_owners
                        .entry(normalize_account(&account))
                        .or_default()
                        .insert(normalize_identifier(&company));
                }
            }
        }

        self.documents += 1;
    }

    /// Forget everything learned this session. Patterns and the known-bad
    /// list are kept.
    pub fn reset(&mut self) {
        debug!("Resetting pattern registry after {} documents", self.documents);
        self.fingerprints.clear();
        self.vendor_accounts.clear();
        self.account_owners.clear();
        self.documents = 0;
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            documents: self.documents,
            fingerprints: self.fingerprints.len(),
            vendors: self.vendor_accounts.len(),
            accounts: self.account_owners.len(),
            known_bad: self.known_bad.len(),
        }
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::from_config(&RuleConfig::default())
    }
}
