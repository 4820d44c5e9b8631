//! Vendor and payment-account rules (phantom vendor, shell company,
//! cross-company fraud) and the identifier extraction they share.

use std::collections::BTreeSet;

use tracing::debug;

use super::patterns::{ACCOUNT_HEADER, ACCOUNT_LABEL, VENDOR_HEADER, VENDOR_LABEL};
use super::{RuleContext, RuleOutcome};
use crate::extract::ExtractedContent;
use crate::models::finding::{Finding, FraudType, RiskLevel};
use crate::registry::RegistryUpdate;

/// A vendor and/or payment account named by a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PartyRef {
    /// Normalized vendor name.
    pub vendor: Option<String>,
    /// Normalized payment account.
    pub account: Option<String>,
}

/// Normalize a vendor/company name for comparison: whitespace collapsed,
/// lowercase, trailing punctuation dropped.
pub fn normalize_identifier(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_string()
}

/// Normalize a payment account: alphanumerics only, uppercase.
pub fn normalize_account(account: &str) -> String {
    account
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Vendors and accounts named in a document, in a stable order.
///
/// Labelled lines ("Vendor: ...", "IBAN: ...") are read from the text view.
/// In text, accounts are attributed to the first vendor named. Tabular content
/// with a vendor and/or account header column adds one entry per row.
pub fn extract_parties(content: &ExtractedContent, text: &str) -> Vec<PartyRef> {
    let mut parties = BTreeSet::new();

    let vendors: Vec<String> = VENDOR_LABEL
        .captures_iter(text)
        .map(|caps| normalize_identifier(&caps[1]))
        .filter(|v| !v.is_empty())
        .collect();
    let accounts: Vec<String> = ACCOUNT_LABEL
        .captures_iter(text)
        .map(|caps| normalize_account(&caps[1]))
        .filter(|a| !a.is_empty())
        .collect();

    let primary = vendors.first().cloned();
    for account in &accounts {
        parties.insert(PartyRef {
            vendor: primary.clone(),
            account: Some(account.clone()),
        });
    }
    for vendor in &vendors {
        if accounts.is_empty() || Some(vendor) != primary.as_ref() {
            parties.insert(PartyRef {
                vendor: Some(vendor.clone()),
                account: None,
            });
        }
    }

    if let Some(rows) = content.rows() {
        parties.extend(parties_from_rows(rows));
    }

    parties.into_iter().collect()
}

fn parties_from_rows(rows: &[Vec<String>]) -> Vec<PartyRef> {
    let header = rows.iter().enumerate().find_map(|(idx, row)| {
        let vendor_col = row.iter().position(|cell| VENDOR_HEADER.is_match(cell));
        let account_col = row.iter().position(|cell| ACCOUNT_HEADER.is_match(cell));
        (vendor_col.is_some() || account_col.is_some()).then_some((idx, vendor_col, account_col))
    });

    let Some((header_idx, vendor_col, account_col)) = header else {
        return Vec::new();
    };

    let cell = |row: &Vec<String>, col: Option<usize>, normalize: fn(&str) -> String| {
        col.and_then(|c| row.get(c))
            .map(|value| normalize(value))
            .filter(|value| !value.is_empty())
    };

    rows[header_idx + 1..]
        .iter()
        .filter_map(|row| {
            let vendor = cell(row, vendor_col, normalize_identifier);
            let account = cell(row, account_col, normalize_account);
            (vendor.is_some() || account.is_some()).then_some(PartyRef { vendor, account })
        })
        .collect()
}

pub fn check_shell_company(ctx: &RuleContext<'_>) -> RuleOutcome {
    let parties = extract_parties(ctx.content, ctx.text);
    let flagged: BTreeSet<&str> = parties
        .iter()
        .filter_map(|p| p.vendor.as_deref())
        .filter(|vendor| ctx.registry.is_known_bad(vendor))
        .collect();

    if flagged.is_empty() {
        return RuleOutcome::clean();
    }

    debug!("{}: known shell companies {:?}", ctx.source, flagged);
    RuleOutcome::found(Finding::new(
        FraudType::ShellCompany,
        RiskLevel::High,
        format!(
            "Vendor on the known shell company list: {}",
            flagged.into_iter().collect::<Vec<_>>().join(", ")
        ),
    ))
}

pub fn check_phantom_vendor(ctx: &RuleContext<'_>) -> RuleOutcome {
    let parties = extract_parties(ctx.content, ctx.text);
    let mut updates = Vec::new();
    let mut suspicious = Vec::new();

    for party in &parties {
        let Some(vendor) = &party.vendor else {
            continue;
        };

        if let (Some(account), Some(known)) = (&party.account, ctx.registry.vendor_accounts(vendor)) {
            if !known.is_empty() && !known.contains(account) {
                suspicious.push(format!(
                    "'{}' is billed to account {} (previously used: {})",
                    vendor,
                    account,
                    known.iter().cloned().collect::<Vec<_>>().join(", ")
                ));
            }
        }

        updates.push(RegistryUpdate::VendorAccount {
            vendor: vendor.clone(),
            account: party.account.clone(),
        });
    }

    if suspicious.is_empty() {
        return RuleOutcome::clean().with_updates(updates);
    }

    debug!("{}: phantom vendor candidates {:?}", ctx.source, suspicious);
    RuleOutcome::found(Finding::new(
        FraudType::PhantomVendor,
        RiskLevel::High,
        format!("Payment details differ from this vendor's history: {}", suspicious.join("; ")),
    ))
    .with_updates(updates)
}

pub fn check_cross_company(ctx: &RuleContext<'_>) -> RuleOutcome {
    let parties = extract_parties(ctx.content, ctx.text);
    let mut updates = Vec::new();
    let mut shared = Vec::new();

    for party in &parties {
        let (Some(vendor), Some(account)) = (&party.vendor, &party.account) else {
            continue;
        };

        if let Some(owners) = ctx.registry.account_owners(account) {
            let others: Vec<&str> = owners
                .iter()
                .filter(|owner| *owner != vendor)
                .map(String::as_str)
                .collect();
            if !others.is_empty() {
                shared.push(format!(
                    "account {} used by '{}' was already used by {}",
                    account,
                    vendor,
                    others.iter().map(|o| format!("'{}'", o)).collect::<Vec<_>>().join(", ")
                ));
            }
        }

        updates.push(RegistryUpdate::AccountOwner {
            account: account.clone(),
            company: vendor.clone(),
        });
    }

    if shared.is_empty() {
        return RuleOutcome::clean().with_updates(updates);
    }

    RuleOutcome::found(Finding::new(
        FraudType::CrossCompanyFraud,
        RiskLevel::Medium,
        format!("Payment account shared across companies: {}", shared.join("; ")),
    ))
    .with_updates(updates)
}
