//! Market price reference used by the overcharging rule.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::PriceError;
use crate::rules::normalize_identifier;

/// Reference prices keyed by normalized item name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceTable {
    prices: HashMap<String, Decimal>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the reference price of an item.
    pub fn insert(&mut self, item: &str, price: Decimal) {
        self.prices.insert(normalize_identifier(item), price);
    }

    /// Reference price of an item, matched case-insensitively.
    pub fn get(&self, item: &str) -> Option<Decimal> {
        self.prices.get(&normalize_identifier(item)).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Parse a JSON object of `{ "item": price }` entries. Prices may be
    /// numbers or numeric strings.
    pub fn from_json(json: &str) -> Result<Self, PriceError> {
        let raw: HashMap<String, Decimal> =
            serde_json::from_str(json).map_err(|e| PriceError::Parse(e.to_string()))?;
        Ok(raw.into_iter().collect())
    }
}

impl<S: AsRef<str>> FromIterator<(S, Decimal)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (S, Decimal)>>(iter: I) -> Self {
        let mut table = PriceTable::new();
        for (item, price) in iter {
            table.insert(item.as_ref(), price);
        }
        table
    }
}

/// Supplies market reference prices.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the current reference prices.
    async fn market_prices(&self) -> Result<PriceTable, PriceError>;
}

/// Fixed price table, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceSource {
    table: PriceTable,
}

impl StaticPriceSource {
    pub fn new(table: PriceTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    async fn market_prices(&self) -> Result<PriceTable, PriceError> {
        Ok(self.table.clone())
    }
}

/// JSON price file. The parsed table is kept until the file's modification
/// time changes, so edits are picked up between documents without reparsing
/// the file for each one.
///
/// Reads are blocking `std::fs` calls on a small local file.
#[derive(Debug)]
pub struct JsonFilePriceSource {
    path: PathBuf,
    cache: Mutex<Option<(SystemTime, PriceTable)>>,
}

impl JsonFilePriceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    fn unavailable(&self, err: impl std::fmt::Display) -> PriceError {
        PriceError::Unavailable(format!("{}: {}", self.path.display(), err))
    }

    fn load(&self) -> Result<PriceTable, PriceError> {
        let json = std::fs::read_to_string(&self.path).map_err(|e| self.unavailable(e))?;
        let table = PriceTable::from_json(&json)?;
        debug!("Loaded {} market prices from {}", table.len(), self.path.display());
        Ok(table)
    }
}

#[async_trait]
impl PriceSource for JsonFilePriceSource {
    async fn market_prices(&self) -> Result<PriceTable, PriceError> {
        let modified = std::fs::metadata(&self.path)
            .map_err(|e| self.unavailable(e))?
            .modified()
            .ok();

        // No modification time on this platform: read every time
        let Some(modified) = modified else {
            return self.load();
        };

        let mut cache = self.cache.lock().map_err(|e| self.unavailable(e))?;
        if let Some((stamp, table)) = cache.as_ref() {
            if *stamp == modified {
                return Ok(table.clone());
            }
        }

        let table = self.load()?;
        *cache = Some((modified, table.clone()));
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup_is_case_insensitive() {
        let table: PriceTable = [("Office Chair", Decimal::new(150, 0))].into_iter().collect();
        assert_eq!(table.get("office  chair"), Some(Decimal::new(150, 0)));
        assert_eq!(table.get("desk"), None);
    }

    #[test]
    fn test_from_json_numbers_and_strings() {
        let table = PriceTable::from_json(r#"{"Desk": 200, "Lamp": "35.50"}"#).unwrap();
        assert_eq!(table.get("desk"), Some(Decimal::new(200, 0)));
        assert_eq!(table.get("lamp"), Some(Decimal::new(3550, 2)));

        assert!(matches!(PriceTable::from_json("[1, 2]"), Err(PriceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_json_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.json");
        std::fs::write(&path, r#"{"widget": 10}"#).unwrap();

        let source = JsonFilePriceSource::new(&path);
        let table = source.market_prices().await.unwrap();
        assert_eq!(table.get("Widget"), Some(Decimal::new(10, 0)));
        assert_eq!(source.market_prices().await.unwrap(), table);
        assert!(source.cache.lock().unwrap().is_some());

        let missing = JsonFilePriceSource::new(dir.path().join("missing.json"));
        assert!(matches!(
            missing.market_prices().await,
            Err(PriceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_json_file_source_reloads_after_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.json");
        std::fs::write(&path, r#"{"widget": 10}"#).unwrap();

        let source = JsonFilePriceSource::new(&path);
        assert_eq!(source.market_prices().await.unwrap().len(), 1);

        std::fs::write(&path, r#"{"widget": 12, "lamp": 30}"#).unwrap();
        // Force a distinct stamp even on coarse-grained filesystems
        let later = SystemTime::now() + std::time::Duration::from_secs(5);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let table = source.market_prices().await.unwrap();
        assert_eq!(table.get("widget"), Some(Decimal::new(12, 0)));
        assert_eq!(table.len(), 2);
    }
}
