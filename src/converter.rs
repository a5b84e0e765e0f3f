//! Fetches live rates and converts amounts between fiat currencies and bitcoin.

use anyhow::{Result, anyhow};
use futures::future::{BoxFuture, FutureExt, join_all};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::core::currency::{BITCOIN, ConversionRequest, RateTable, is_bitcoin};
use crate::core::error::ConversionError;
use crate::core::rates::{BitcoinTickerProvider, FiatRateProvider, FiatRates, Ticker};

/// Result of one provider call, tagged with the provider that produced it.
#[derive(Debug)]
enum RateSource {
    Fiat(FiatRates),
    Ticker(Ticker),
}

/// Which rates a conversion needs and how to apply them.
#[derive(Debug, Clone, PartialEq)]
struct FetchPlan<'a> {
    base: &'a str,
    include_bitcoin: bool,
    from: &'a str,
    to: &'a str,
}

impl<'a> FetchPlan<'a> {
    fn for_request(request: &'a ConversionRequest) -> Self {
        let include_bitcoin = request.involves_bitcoin();
        // Bitcoin is spliced into the table of the other currency, so the
        // table answers "base per BTC" and the direction has to flip.
        if include_bitcoin {
            let base = if is_bitcoin(&request.from) {
                request.to.as_str()
            } else {
                request.from.as_str()
            };
            FetchPlan {
                base,
                include_bitcoin,
                from: &request.to,
                to: &request.from,
            }
        } else {
            FetchPlan {
                base: &request.from,
                include_bitcoin,
                from: &request.from,
                to: &request.to,
            }
        }
    }
}

pub struct Converter {
    fiat_provider: Arc<dyn FiatRateProvider>,
    ticker_provider: Arc<dyn BitcoinTickerProvider>,
}

impl Converter {
    pub fn new(
        fiat_provider: Arc<dyn FiatRateProvider>,
        ticker_provider: Arc<dyn BitcoinTickerProvider>,
    ) -> Self {
        Self {
            fiat_provider,
            ticker_provider,
        }
    }

    /// Converts `request.amount` from `request.from` into `request.to`.
    ///
    /// Every failure, whether upstream or an unknown currency code, yields the
    /// same [`ConversionError`] message; the cause is available through
    /// `source()` and `kind()`.
    #[instrument(
        name = "Convert",
        skip(self, request),
        fields(amount = request.amount, from = %request.from, to = %request.to)
    )]
    pub async fn convert(&self, request: &ConversionRequest) -> Result<f64, ConversionError> {
        validate(request)?;

        let plan = FetchPlan::for_request(request);
        debug!(?plan, "Resolved fetch plan");

        let table = self.rate_table(plan.base, plan.include_bitcoin).await?;

        table
            .convert(request.amount, plan.from, plan.to)
            .map_err(|e| {
                warn!(error = %e, "Rate table cannot resolve conversion");
                ConversionError::unknown_currency(e)
            })
    }

    /// Builds the rate table for `base`, adding bitcoin's price in `base`
    /// under `BTC` when `include_bitcoin` is set.
    #[instrument(name = "RateTable", skip(self))]
    pub async fn rate_table(
        &self,
        base: &str,
        include_bitcoin: bool,
    ) -> Result<RateTable, ConversionError> {
        if is_bitcoin(base) {
            return Err(ConversionError::invalid_request(
                "Bitcoin cannot be used as the base of a fiat rate table",
            ));
        }

        let mut requests: Vec<BoxFuture<'_, Result<RateSource>>> = vec![
            self.fiat_provider
                .fetch_rates(base)
                .map(|r| r.map(RateSource::Fiat))
                .boxed(),
        ];
        if include_bitcoin {
            requests.push(
                self.ticker_provider
                    .fetch_ticker()
                    .map(|r| r.map(RateSource::Ticker))
                    .boxed(),
            );
        }

        let sources = join_all(requests)
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()
            .map_err(|e| {
                warn!(error = %e, "Rate fetch failed");
                ConversionError::upstream(e)
            })?;

        assemble(base, sources).map_err(ConversionError::unknown_currency)
    }
}

fn validate(request: &ConversionRequest) -> Result<(), ConversionError> {
    if !request.amount.is_finite() || request.amount < 0.0 {
        return Err(ConversionError::invalid_request(format!(
            "Amount must be a non-negative number, got {}",
            request.amount
        )));
    }
    if is_bitcoin(&request.from) && is_bitcoin(&request.to) {
        return Err(ConversionError::invalid_request(
            "Converting bitcoin into bitcoin is not supported",
        ));
    }
    Ok(())
}

fn assemble(base: &str, sources: Vec<RateSource>) -> Result<RateTable> {
    let mut fiat = None;
    let mut ticker = None;
    for source in sources {
        match source {
            RateSource::Fiat(rates) => fiat = Some(rates),
            RateSource::Ticker(t) => ticker = Some(t),
        }
    }

    let fiat = fiat.ok_or_else(|| anyhow!("No fiat rates fetched for {}", base))?;
    let mut table = RateTable::new(&fiat.base, fiat.rates);

    if let Some(ticker) = ticker {
        let last = ticker
            .last(base)
            .ok_or_else(|| anyhow!("Bitcoin ticker has no price in {}", base))?;
        table.insert(BITCOIN, last);
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ConversionErrorKind;
    use crate::core::rates::TickerEntry;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const USD_EUR: f64 = 0.899;
    const EUR_USD: f64 = 1.1122;
    const BTC_USD: f64 = 8944.49;
    const BTC_EUR: f64 = 8048.11;

    struct MockFiatProvider {
        call_count: AtomicUsize,
    }

    #[async_trait]
    impl FiatRateProvider for MockFiatProvider {
        async fn fetch_rates(&self, base: &str) -> Result<FiatRates> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let rates = match base {
                "USD" => HashMap::from([("EUR".to_string(), USD_EUR)]),
                "EUR" => HashMap::from([("USD".to_string(), EUR_USD)]),
                // Known to the fiat provider but not to the ticker
                "CHF" => HashMap::from([("USD".to_string(), 1.01)]),
                _ => {
                    return Err(anyhow!(
                        "HTTP error: 400 Bad Request for base currency: {}",
                        base
                    ));
                }
            };
            Ok(FiatRates {
                base: base.to_string(),
                rates,
            })
        }
    }

    struct MockTickerProvider {
        call_count: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl BitcoinTickerProvider for MockTickerProvider {
        async fn fetch_ticker(&self) -> Result<Ticker> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!(
                    "HTTP error: 503 Service Unavailable for bitcoin ticker"
                ));
            }
            let entry = |last: f64| TickerEntry { last, symbol: None };
            Ok(Ticker(HashMap::from([
                ("USD".to_string(), entry(BTC_USD)),
                ("EUR".to_string(), entry(BTC_EUR)),
            ])))
        }
    }

    fn setup(ticker_fails: bool) -> (Arc<MockFiatProvider>, Arc<MockTickerProvider>, Converter) {
        let fiat = Arc::new(MockFiatProvider {
            call_count: AtomicUsize::new(0),
        });
        let ticker = Arc::new(MockTickerProvider {
            call_count: AtomicUsize::new(0),
            fail: ticker_fails,
        });
        let converter = Converter::new(fiat.clone(), ticker.clone());
        (fiat, ticker, converter)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= f64::EPSILON * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_fetch_plan() {
        let request = ConversionRequest::new(1.0, "USD", "EUR");
        let plan = FetchPlan::for_request(&request);
        assert_eq!(plan.base, "USD");
        assert!(!plan.include_bitcoin);
        assert_eq!((plan.from, plan.to), ("USD", "EUR"));

        let request = ConversionRequest::new(1.0, "BTC", "EUR");
        let plan = FetchPlan::for_request(&request);
        assert_eq!(plan.base, "EUR");
        assert!(plan.include_bitcoin);
        assert_eq!((plan.from, plan.to), ("EUR", "BTC"));

        let request = ConversionRequest::default();
        let plan = FetchPlan::for_request(&request);
        assert_eq!(plan.base, "USD");
        assert_eq!((plan.from, plan.to), ("BTC", "USD"));
    }

    #[tokio::test]
    async fn test_fiat_conversion_skips_ticker() {
        let (fiat, ticker, converter) = setup(false);

        let result = converter
            .convert(&ConversionRequest::new(1.0, "USD", "EUR"))
            .await
            .unwrap();
        assert_eq!(result, USD_EUR);

        let result = converter
            .convert(&ConversionRequest::new(1.0, "EUR", "USD"))
            .await
            .unwrap();
        assert_eq!(result, EUR_USD);

        assert_eq!(fiat.call_count.load(Ordering::SeqCst), 2);
        assert_eq!(ticker.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_same_currency_returns_amount() {
        let (_, _, converter) = setup(false);
        for (amount, code) in [(1.0, "EUR"), (12.5, "USD"), (0.0, "EUR")] {
            let result = converter
                .convert(&ConversionRequest::new(amount, code, code))
                .await
                .unwrap();
            assert_eq!(result, amount);
        }
    }

    #[tokio::test]
    async fn test_bitcoin_to_fiat() {
        let (fiat, ticker, converter) = setup(false);

        let result = converter
            .convert(&ConversionRequest::new(1.0, "BTC", "USD"))
            .await
            .unwrap();
        assert_eq!(result, BTC_USD);

        let result = converter
            .convert(&ConversionRequest::new(1.0, "BTC", "EUR"))
            .await
            .unwrap();
        assert_eq!(result, BTC_EUR);

        assert_eq!(fiat.call_count.load(Ordering::SeqCst), 2);
        assert_eq!(ticker.call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fiat_to_bitcoin_defaults() {
        let (_, _, converter) = setup(false);

        let result = converter
            .convert(&ConversionRequest::default())
            .await
            .unwrap();
        assert_close(result, 1.0 / BTC_USD);

        let result = converter
            .convert(&ConversionRequest::default().amount(3.0))
            .await
            .unwrap();
        assert_close(result, 3.0 / BTC_USD);

        let result = converter
            .convert(&ConversionRequest::default().amount(4.0).from("USD"))
            .await
            .unwrap();
        assert_close(result, 4.0 / BTC_USD);
    }

    #[tokio::test]
    async fn test_bitcoin_round_trip_is_consistent() {
        let (_, _, converter) = setup(false);

        let btc_to_eur = converter
            .convert(&ConversionRequest::new(2.0, "BTC", "EUR"))
            .await
            .unwrap();
        let eur_to_btc = converter
            .convert(&ConversionRequest::new(1.0, "EUR", "BTC"))
            .await
            .unwrap();
        assert!((btc_to_eur * eur_to_btc - 2.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_unknown_currencies() {
        let (_, ticker, converter) = setup(false);

        let err = converter
            .convert(&ConversionRequest::new(1.0, "LIBRA", "CORONACOIN"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please specify a valid `from` and/or `to` currency value!"
        );
        assert_eq!(err.kind(), ConversionErrorKind::Upstream);
        assert_eq!(ticker.call_count.load(Ordering::SeqCst), 0);

        let err = converter
            .convert(&ConversionRequest::new(1.0, "USD", "CORONACOIN"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ConversionErrorKind::UnknownCurrency);
        assert_eq!(err.detail(), "No rate for CORONACOIN in table based on USD");
    }

    #[tokio::test]
    async fn test_fiat_missing_from_ticker() {
        let (_, _, converter) = setup(false);

        let err = converter
            .convert(&ConversionRequest::new(1.0, "CHF", "BTC"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ConversionErrorKind::UnknownCurrency);
        assert_eq!(err.detail(), "Bitcoin ticker has no price in CHF");
    }

    #[tokio::test]
    async fn test_ticker_failure_waits_for_fiat() {
        let (fiat, ticker, converter) = setup(true);

        let err = converter
            .convert(&ConversionRequest::new(1.0, "BTC", "USD"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ConversionErrorKind::Upstream);
        assert!(err.detail().contains("bitcoin ticker"));
        assert_eq!(fiat.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(ticker.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_requests_do_not_fetch() {
        let (fiat, ticker, converter) = setup(false);

        let err = converter
            .convert(&ConversionRequest::new(1.0, "BTC", "BTC"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ConversionErrorKind::InvalidRequest);

        let err = converter
            .convert(&ConversionRequest::new(-1.0, "USD", "EUR"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ConversionErrorKind::InvalidRequest);

        let err = converter
            .convert(&ConversionRequest::new(f64::NAN, "USD", "EUR"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ConversionErrorKind::InvalidRequest);

        assert_eq!(fiat.call_count.load(Ordering::SeqCst), 0);
        assert_eq!(ticker.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rate_table_with_bitcoin() {
        let (_, _, converter) = setup(false);

        let table = converter.rate_table("EUR", true).await.unwrap();
        assert_eq!(table.base(), "EUR");
        assert_eq!(table.get("EUR"), Some(1.0));
        assert_eq!(table.get("USD"), Some(EUR_USD));
        assert_eq!(table.get("BTC"), Some(BTC_EUR));

        let table = converter.rate_table("EUR", false).await.unwrap();
        assert!(table.get("BTC").is_none());

        let err = converter.rate_table("BTC", true).await.unwrap_err();
        assert_eq!(err.kind(), ConversionErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_concurrent_conversions_do_not_share_tables() {
        let (_, _, converter) = setup(false);
        let converter = Arc::new(converter);

        let requests = [
            ConversionRequest::new(1.0, "USD", "EUR"),
            ConversionRequest::new(1.0, "EUR", "USD"),
            ConversionRequest::new(1.0, "BTC", "USD"),
            ConversionRequest::new(1.0, "BTC", "EUR"),
        ];
        let handles: Vec<_> = requests
            .iter()
            .cloned()
            .map(|request| {
                let converter = Arc::clone(&converter);
                tokio::spawn(async move { converter.convert(&request).await.unwrap() })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }
        assert_eq!(results, vec![USD_EUR, EUR_USD, BTC_USD, BTC_EUR]);
    }
}
