use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::core::rates::{FiatRateProvider, FiatRates};

// ExchangeRatesProvider implementation for FiatRateProvider
pub struct ExchangeRatesProvider {
    base_url: String,
}

impl ExchangeRatesProvider {
    pub fn new(base_url: &str) -> Self {
        ExchangeRatesProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FiatRateProvider for ExchangeRatesProvider {
    #[instrument(name = "FiatRatesFetch", skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &str) -> Result<FiatRates> {
        let url = format!("{}/latest?base={}", self.base_url, base);
        debug!("Requesting fiat rates from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("currency/0.1")
            .build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for base currency: {}", e, base))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for base currency: {}",
                response.status(),
                base
            ));
        }

        let text = response.text().await?;

        let rates: FiatRates = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse fiat rates for {}: {}", base, e))?;
        debug!(count = rates.rates.len(), "Received fiat rates");

        Ok(rates)
    }
}
