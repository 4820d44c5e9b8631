//! WASM bindings for invoice fraud screening.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use js_sys::Promise;
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use invguard_core::{
    ExtractedContent, FindingTally, InvguardConfig, PriceTable, StaticPriceSource, RULES,
};

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(to_js_error)
}

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// List the fraud rules with their status.
#[wasm_bindgen]
pub fn rules() -> Result<JsValue, JsValue> {
    to_js(&RULES)
}

/// Content fingerprint (hex SHA-256) of a text.
#[wasm_bindgen]
pub fn fingerprint(text: &str) -> String {
    invguard_core::fingerprint(text)
}

/// Fraud scanner class for browser use.
///
/// Documents scanned through one instance share a session: duplicates and
/// vendor/account history are remembered until `reset()` is called.
#[wasm_bindgen]
pub struct FraudScanner {
    inner: Rc<RefCell<invguard_core::FraudScanner>>,
    tally: Rc<RefCell<FindingTally>>,
}

#[wasm_bindgen]
impl FraudScanner {
    /// Create a scanner, optionally from a JSON configuration string.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<FraudScanner, JsValue> {
        let config: InvguardConfig = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(to_js_error)?,
            None => InvguardConfig::default(),
        };

        Ok(Self {
            inner: Rc::new(RefCell::new(invguard_core::FraudScanner::new(&config))),
            tally: Rc::new(RefCell::new(FindingTally::default())),
        })
    }

    /// Set market reference prices from an object of `{ item: price }`.
    #[wasm_bindgen]
    pub fn set_prices(&self, prices: JsValue) -> Result<(), JsValue> {
        let raw: HashMap<String, Decimal> =
            serde_wasm_bindgen::from_value(prices).map_err(to_js_error)?;
        let table: PriceTable = raw.into_iter().collect();

        let mut scanner = self
            .inner
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("scanner is busy"))?;
        let current = std::mem::take(&mut *scanner);
        *scanner = current.with_price_source(Arc::new(StaticPriceSource::new(table)));
        Ok(())
    }

    /// Scan a text document. Resolves to the document report.
    #[wasm_bindgen]
    pub fn scan_text(&self, source: String, text: String) -> Promise {
        self.scan_content(source, ExtractedContent::Text(text))
    }

    /// Scan tabular content given as an array of string arrays.
    #[wasm_bindgen]
    pub fn scan_rows(&self, source: String, rows: JsValue) -> Result<Promise, JsValue> {
        let rows: Vec<Vec<String>> = serde_wasm_bindgen::from_value(rows).map_err(to_js_error)?;
        Ok(self.scan_content(source, ExtractedContent::Rows(rows)))
    }

    /// Scan a file's bytes; the format is taken from the file name.
    #[wasm_bindgen]
    pub fn scan_bytes(&self, name: String, data: Vec<u8>) -> Promise {
        let inner = self.inner.clone();
        let tally = self.tally.clone();

        future_to_promise(async move {
            let mut scanner = inner
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str("scanner is busy"))?;
            let report = scanner.process_bytes(&name, &data).await.map_err(to_js_error)?;
            tally.borrow_mut().extend(&report.findings);
            to_js(&report)
        })
    }

    /// Finding counts by type and risk for everything scanned so far.
    #[wasm_bindgen]
    pub fn tally(&self) -> Result<JsValue, JsValue> {
        to_js(&*self.tally.borrow())
    }

    /// Number of documents remembered in the current session.
    #[wasm_bindgen]
    pub fn documents_seen(&self) -> usize {
        self.inner.borrow().stats().documents
    }

    /// Forget earlier documents and start a new session.
    #[wasm_bindgen]
    pub fn reset(&self) -> Result<(), JsValue> {
        self.inner
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("scanner is busy"))?
            .reset();
        *self.tally.borrow_mut() = FindingTally::default();
        Ok(())
    }

    fn scan_content(&self, source: String, content: ExtractedContent) -> Promise {
        let inner = self.inner.clone();
        let tally = self.tally.clone();

        future_to_promise(async move {
            let mut scanner = inner
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str("scanner is busy"))?;
            let report = scanner.process_content(&source, content).await;
            tally.borrow_mut().extend(&report.findings);
            to_js(&report)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    async fn findings(promise: Promise) -> Vec<serde_json::Value> {
        let value = JsFuture::from(promise).await.unwrap();
        let report: serde_json::Value = serde_wasm_bindgen::from_value(value).unwrap();
        report["findings"].as_array().cloned().unwrap_or_default()
    }

    #[wasm_bindgen_test]
    fn test_fingerprint() {
        assert_eq!(fingerprint("abc").len(), 64);
    }

    #[wasm_bindgen_test]
    async fn test_scan_text_phishing() {
        let scanner = FraudScanner::new(None).unwrap();
        let found = findings(scanner.scan_text(
            "mail".to_string(),
            "URGENT: invoice payment required immediately".to_string(),
        ))
        .await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["type"], "Phishing Scam");
        assert_eq!(found[0]["risk"], "high");
    }

    #[wasm_bindgen_test]
    async fn test_duplicates_until_reset() {
        let scanner = FraudScanner::new(None).unwrap();
        let text = "Invoice 12 for consulting".to_string();

        assert!(findings(scanner.scan_text("a".into(), text.clone())).await.is_empty());
        let second = findings(scanner.scan_text("b".into(), text.clone())).await;
        assert_eq!(second[0]["type"], "Duplicate Invoice");

        scanner.reset().unwrap();
        assert_eq!(scanner.documents_seen(), 0);
        assert!(findings(scanner.scan_text("c".into(), text)).await.is_empty());
    }

    #[wasm_bindgen_test]
    async fn test_unsupported_bytes_reject() {
        let scanner = FraudScanner::new(None).unwrap();
        let result = JsFuture::from(scanner.scan_bytes("notes.txt".into(), b"hi".to_vec())).await;
        assert!(result.is_err());
    }
}
