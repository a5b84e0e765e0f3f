use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::core::rates::{BitcoinTickerProvider, Ticker};

// BlockchainTickerProvider implementation for BitcoinTickerProvider
pub struct BlockchainTickerProvider {
    base_url: String,
}

impl BlockchainTickerProvider {
    pub fn new(base_url: &str) -> Self {
        BlockchainTickerProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BitcoinTickerProvider for BlockchainTickerProvider {
    #[instrument(name = "BitcoinTickerFetch", skip(self))]
    async fn fetch_ticker(&self) -> Result<Ticker> {
        let url = format!("{}/ticker", self.base_url);
        debug!("Requesting bitcoin ticker from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("currency/0.1")
            .build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for bitcoin ticker", e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for bitcoin ticker",
                response.status()
            ));
        }

        let text = response.text().await?;

        let ticker: Ticker = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse bitcoin ticker: {}", e))?;
        debug!(currencies = ticker.0.len(), "Received bitcoin ticker");

        Ok(ticker)
    }
}
