//! Conversion requests and the rate table used to resolve them

use anyhow::{Result, anyhow};
use std::collections::HashMap;

pub const BITCOIN: &str = "BTC";
pub const DEFAULT_FROM: &str = "USD";
pub const DEFAULT_TO: &str = BITCOIN;

pub fn is_bitcoin(code: &str) -> bool {
    code == BITCOIN
}

/// An amount to convert between two currency codes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            amount: 1.0,
            from: DEFAULT_FROM.to_string(),
            to: DEFAULT_TO.to_string(),
        }
    }
}

impl ConversionRequest {
    pub fn new(amount: f64, from: &str, to: &str) -> Self {
        Self {
            amount,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    pub fn from(mut self, from: &str) -> Self {
        self.from = from.to_string();
        self
    }

    pub fn to(mut self, to: &str) -> Self {
        self.to = to.to_string();
        self
    }

    pub fn involves_bitcoin(&self) -> bool {
        is_bitcoin(&self.from) || is_bitcoin(&self.to)
    }
}

/// Rates relative to a single base currency.
///
/// The base always resolves to `1.0`, so converting a code into itself
/// returns the amount unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    base: String,
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new(base: &str, mut rates: HashMap<String, f64>) -> Self {
        rates.insert(base.to_string(), 1.0);
        Self {
            base: base.to_string(),
            rates,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn rates(&self) -> &HashMap<String, f64> {
        &self.rates
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn insert(&mut self, code: &str, rate: f64) {
        self.rates.insert(code.to_string(), rate);
    }

    fn resolve(&self, code: &str) -> Result<f64> {
        self.get(code)
            .filter(|rate| rate.is_finite() && *rate != 0.0)
            .ok_or_else(|| anyhow!("No rate for {} in table based on {}", code, self.base))
    }

    /// Multiplier that turns one unit of `from` into `to`.
    pub fn rate(&self, from: &str, to: &str) -> Result<f64> {
        let from_rate = self.resolve(from)?;
        let to_rate = self.resolve(to)?;

        if from == self.base {
            return Ok(to_rate);
        }
        if to == self.base {
            return Ok(1.0 / from_rate);
        }
        Ok(to_rate * (1.0 / from_rate))
    }

    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64> {
        Ok(amount * self.rate(from, to)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd_table() -> RateTable {
        RateTable::new(
            "USD",
            HashMap::from([("EUR".to_string(), 0.899), ("GBP".to_string(), 0.8)]),
        )
    }

    #[test]
    fn test_request_defaults() {
        let request = ConversionRequest::default();
        assert_eq!(request.amount, 1.0);
        assert_eq!(request.from, "USD");
        assert_eq!(request.to, "BTC");
        assert!(request.involves_bitcoin());

        let request = ConversionRequest::default().amount(4.0).to("EUR");
        assert_eq!(request, ConversionRequest::new(4.0, "USD", "EUR"));
        assert!(!request.involves_bitcoin());
    }

    #[test]
    fn test_base_is_identity() {
        let table = usd_table();
        assert_eq!(table.get("USD"), Some(1.0));
        assert_eq!(table.convert(7.5, "USD", "USD").unwrap(), 7.5);
        assert_eq!(table.convert(2.0, "EUR", "EUR").unwrap(), 2.0);
    }

    #[test]
    fn test_convert_from_base() {
        let table = usd_table();
        assert_eq!(table.convert(1.0, "USD", "EUR").unwrap(), 0.899);
        assert_eq!(table.convert(10.0, "USD", "GBP").unwrap(), 8.0);
    }

    #[test]
    fn test_convert_to_base() {
        let table = usd_table();
        let result = table.convert(1.0, "EUR", "USD").unwrap();
        assert!((result - 1.0 / 0.899).abs() < 1e-12);
    }

    #[test]
    fn test_cross_rate() {
        let table = usd_table();
        let result = table.convert(1.0, "EUR", "GBP").unwrap();
        assert!((result - 0.8 / 0.899).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_code() {
        let table = usd_table();
        let err = table.convert(1.0, "USD", "LIBRA").unwrap_err();
        assert_eq!(err.to_string(), "No rate for LIBRA in table based on USD");
        assert!(table.convert(1.0, "CORONACOIN", "USD").is_err());
    }

    #[test]
    fn test_zero_rate_is_unresolvable() {
        let mut table = usd_table();
        table.insert("XYZ", 0.0);
        assert!(table.rate("XYZ", "USD").is_err());
    }
}
