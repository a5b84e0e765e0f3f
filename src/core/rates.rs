//! Rate provider abstractions and their payloads

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fiat rates relative to `base`, as served by the exchange rates API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiatRates {
    pub base: String,
    pub rates: HashMap<String, f64>,
}

/// Bitcoin price in a single fiat currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerEntry {
    pub last: f64,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Bitcoin prices keyed by fiat currency code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(pub HashMap<String, TickerEntry>);

impl Ticker {
    /// Last bitcoin price expressed in `code`.
    pub fn last(&self, code: &str) -> Option<f64> {
        self.0.get(code).map(|entry| entry.last)
    }
}

#[async_trait]
pub trait FiatRateProvider: Send + Sync {
    async fn fetch_rates(&self, base: &str) -> Result<FiatRates>;
}

#[async_trait]
pub trait BitcoinTickerProvider: Send + Sync {
    async fn fetch_ticker(&self) -> Result<Ticker>;
}
