//! Market prices fetched over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use invguard_core::{PriceError, PriceSource, PriceTable};

/// Fetches a JSON object of `{ "item": price }` entries from a URL.
pub struct HttpPriceSource {
    client: reqwest::Client,
    url: String,
}

impl HttpPriceSource {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn market_prices(&self) -> Result<PriceTable, PriceError> {
        debug!("Fetching market prices from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PriceError::Unavailable(format!("{}: {}", self.url, e)))?;

        let body = response
            .text()
            .await
            .map_err(|e| PriceError::Unavailable(format!("{}: {}", self.url, e)))?;

        PriceTable::from_json(&body)
    }
}
