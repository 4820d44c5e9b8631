//! Overcharging: line item prices compared against market reference prices.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::patterns::{ITEM_HEADER, LINE_ITEM, PRICE_HEADER};
use super::{Result, RuleContext, RuleOutcome};
use crate::extract::ExtractedContent;
use crate::models::finding::{Finding, FraudType, RiskLevel};

/// A priced line on an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub price: Decimal,
}

/// Line items of a document.
///
/// Tabular content needs a header row with an item column and a price
/// column. Text content is read line by line ("Office chair: $250.00").
pub fn extract_line_items(content: &ExtractedContent, text: &str) -> Vec<LineItem> {
    match content {
        ExtractedContent::Rows(rows) => line_items_from_rows(rows),
        ExtractedContent::Text(_) => LINE_ITEM
            .captures_iter(text)
            .filter_map(|caps| {
                let name = caps[1].trim().to_string();
                let price = parse_price(&caps[2])?;
                Some(LineItem { name, price })
            })
            .collect(),
    }
}

fn line_items_from_rows(rows: &[Vec<String>]) -> Vec<LineItem> {
    let header = rows.iter().enumerate().find_map(|(idx, row)| {
        let item_col = row.iter().position(|cell| ITEM_HEADER.is_match(cell))?;
        let price_col = row.iter().position(|cell| PRICE_HEADER.is_match(cell))?;
        Some((idx, item_col, price_col))
    });

    let Some((header_idx, item_col, price_col)) = header else {
        trace!("No item/price header row found");
        return Vec::new();
    };

    rows[header_idx + 1..]
        .iter()
        .filter_map(|row| {
            let name = row.get(item_col)?.trim();
            if name.is_empty() {
                return None;
            }
            let price = parse_price(row.get(price_col)?)?;
            Some(LineItem {
                name: name.to_string(),
                price,
            })
        })
        .collect()
}

/// Parse a price such as "$1,234.56", "1.234,56" or "99".
pub fn parse_price(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) | (0, 1) => cleaned,
        // Thousands separators only: "1,234" or "1,234,567"
        (_, 0) if is_grouped(&cleaned, ',') => cleaned.replace(',', ""),
        (1, 0) => cleaned.replace(',', "."),
        (0, _) if is_grouped(&cleaned, '.') => cleaned.replace('.', ""),
        _ => {
            // Both present: whichever comes last is the decimal separator
            match (cleaned.rfind(','), cleaned.rfind('.')) {
                (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
                (Some(_), Some(_)) => cleaned.replace(',', ""),
                _ => return None,
            }
        }
    };

    Decimal::from_str(&normalized).ok()
}

/// "1,234,567": digit groups of three after the first separator.
fn is_grouped(s: &str, sep: char) -> bool {
    let mut parts = s.split(sep);
    let head_ok = parts
        .next()
        .is_some_and(|head| (1..=3).contains(&head.len()));
    head_ok && parts.all(|group| group.len() == 3)
}

pub async fn check_overcharging(ctx: &RuleContext<'_>) -> Result<RuleOutcome> {
    let items = extract_line_items(ctx.content, ctx.text);
    if items.is_empty() {
        return Ok(RuleOutcome::clean());
    }

    let table = ctx.prices.market_prices().await?;
    debug!(
        "{}: checking {} line items against {} market prices",
        ctx.source,
        items.len(),
        table.len()
    );

    let overpriced: Vec<String> = items
        .iter()
        .filter_map(|item| {
            let reference = table.get(&item.name)?;
            if reference <= Decimal::ZERO {
                return None;
            }
            // A limit beyond the Decimal range cannot be exceeded
            let limit = reference.checked_mul(ctx.overcharge_ratio)?;
            if item.price <= limit {
                return None;
            }
            let times = item
                .price
                .checked_div(reference)
                .map(|x| format!("{}x", x.round_dp(2).normalize()))
                .unwrap_or_else(|| "out of range".to_string());
            Some(format!(
                "{} charged {} vs market {} ({})",
                item.name, item.price, reference, times
            ))
        })
        .collect();

    if overpriced.is_empty() {
        return Ok(RuleOutcome::clean());
    }

    Ok(RuleOutcome::found(Finding::new(
        FraudType::Overcharging,
        RiskLevel::High,
        format!(
            "Prices exceed {}x the market reference: {}",
            ctx.overcharge_ratio.normalize(),
            overpriced.join("; ")
        ),
    )))
}
