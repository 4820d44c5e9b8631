//! Rules command - list the fraud rules and whether they run.

use clap::Args;
use console::style;
use serde::Serialize;

use invguard_core::{FraudType, RuleStatus, RULES};

use super::config::load_config;

/// Arguments for the rules command.
#[derive(Args)]
pub struct RulesArgs {
    /// Print the rule list as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RuleRow {
    key: &'static str,
    #[serde(rename = "type")]
    fraud_type: FraudType,
    status: RuleStatus,
    enabled: bool,
    stateful: bool,
    description: &'static str,
}

pub fn run(args: RulesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let disabled = config.rules.disabled_types();

    let rows: Vec<RuleRow> = RULES
        .iter()
        .map(|rule| RuleRow {
            key: rule.fraud_type.key(),
            fraud_type: rule.fraud_type,
            status: rule.status,
            enabled: !disabled.contains(&rule.fraud_type),
            stateful: rule.stateful,
            description: rule.description,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for row in &rows {
        let status = match (row.status, row.enabled) {
            (RuleStatus::Reserved, _) => style("reserved").dim(),
            (RuleStatus::Active, false) => style("disabled").yellow(),
            (RuleStatus::Active, true) => style("active").green(),
        };
        let memory = if row.stateful { " (session)" } else { "" };

        println!(
            "{:<22} {:<16} {:<9} {}{}",
            row.fraud_type.label(),
            row.key,
            status,
            row.description,
            memory
        );
    }

    Ok(())
}
