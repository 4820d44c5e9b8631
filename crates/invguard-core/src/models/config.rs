//! Configuration structures for the scanning pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::finding::FraudType;

/// Main configuration for invguard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvguardConfig {
    /// Fraud rule configuration.
    pub rules: RuleConfig,

    /// Content extraction configuration.
    pub extraction: ExtractionConfig,

    /// Market price reference configuration.
    pub prices: PriceConfig,
}

/// Fraud rule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// A line item is overcharged when its price exceeds this multiple of
    /// the market reference price.
    pub overcharge_ratio: Decimal,

    /// Vendor/company names that are always treated as shell companies.
    pub known_bad_vendors: Vec<String>,

    /// Rules that are not run (keys such as "kickback" or labels such as
    /// "Kickback").
    pub disabled: Vec<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            overcharge_ratio: Decimal::new(15, 1),
            known_bad_vendors: vec![
                "Shell Corp Ltd".to_string(),
                "Offshore Holdings Inc".to_string(),
                "Fake Company LLC".to_string(),
            ],
            disabled: Vec::new(),
        }
    }
}

impl RuleConfig {
    /// Resolve `disabled` into fraud types, ignoring unknown names.
    pub fn disabled_types(&self) -> Vec<FraudType> {
        self.disabled
            .iter()
            .filter_map(|name| FraudType::from_key(name))
            .collect()
    }
}

/// Content extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Worksheet rows beyond this count are ignored (0 = unlimited).
    pub max_rows: usize,

    /// Field delimiter for CSV input.
    pub csv_delimiter: char,

    /// Try an empty password on encrypted PDFs before giving up.
    pub decrypt_empty_password: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_rows: 10_000,
            csv_delimiter: ',',
            decrypt_empty_password: true,
        }
    }
}

/// Market price reference configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    /// Inline reference prices keyed by item name.
    pub table: BTreeMap<String, Decimal>,

    /// JSON file with `{ "item": price }` entries.
    pub file: Option<PathBuf>,

    /// HTTP endpoint returning the same JSON object.
    pub url: Option<String>,

    /// Request timeout for the HTTP endpoint in milliseconds.
    pub timeout_ms: u64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            table: BTreeMap::new(),
            file: None,
            url: None,
            timeout_ms: 5_000,
        }
    }
}

impl InvguardConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: InvguardConfig =
            serde_json::from_str(r#"{ "rules": { "disabled": ["kickback"] } }"#).unwrap();

        assert_eq!(config.rules.overcharge_ratio, Decimal::new(15, 1));
        assert_eq!(config.rules.disabled_types(), vec![FraudType::Kickback]);
        assert_eq!(config.extraction.csv_delimiter, ',');
        assert_eq!(config.prices.timeout_ms, 5_000);
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = InvguardConfig::default();
        config.prices.table.insert("widget".to_string(), Decimal::new(1000, 2));
        config.save(&path).unwrap();

        let loaded = InvguardConfig::from_file(&path).unwrap();
        assert_eq!(loaded.prices.table.get("widget"), Some(&Decimal::new(1000, 2)));
        assert_eq!(loaded.rules.known_bad_vendors, config.rules.known_bad_vendors);
    }
}
