//! CurrencyConverter - cached exchange rates and price conversion.
//!
//! Rates are cached per pair for the configured TTL. A miss fetches the
//! whole table for the base currency and caches every pair it quotes.
//! Concurrent misses on one pair wait on a per-pair gate, so the source
//! sees a single request.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::domain::currency::{apply_rate, validate_amount, Conversion, CurrencyError, ExchangeRate};
use crate::domain::foundation::{Currency, Timestamp};
use crate::ports::ExchangeRateSource;

type Pair = (Currency, Currency);
type Gates = DashMap<Pair, Arc<Mutex<()>>>;

/// Membership in a pair's fetch gate.
///
/// Dropping the last member removes the gate, also when the caller is
/// cancelled while waiting.
struct FetchGate<'a> {
    gates: &'a Gates,
    pair: &'a Pair,
    gate: Arc<Mutex<()>>,
}

impl<'a> FetchGate<'a> {
    fn enter(gates: &'a Gates, pair: &'a Pair) -> Self {
        let gate = gates.entry(pair.clone()).or_default().clone();
        Self { gates, pair, gate }
    }

    async fn lock(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }
}

impl Drop for FetchGate<'_> {
    fn drop(&mut self) {
        // The map's handle plus ours: nobody else holds or waits on it.
        self.gates
            .remove_if(self.pair, |_, gate| Arc::strong_count(gate) == 2);
    }
}

pub struct CurrencyConverter {
    source: Arc<dyn ExchangeRateSource>,
    ttl_secs: u64,
    cache: RwLock<HashMap<Pair, ExchangeRate>>,
    inflight: Gates,
}

impl CurrencyConverter {
    pub fn new(source: Arc<dyn ExchangeRateSource>, ttl_secs: u64) -> Self {
        Self {
            source,
            ttl_secs,
            cache: RwLock::new(HashMap::new()),
            inflight: DashMap::new(),
        }
    }

    /// Current rate for `from → to`.
    pub async fn rate(&self, from: &Currency, to: &Currency) -> Result<ExchangeRate, CurrencyError> {
        if from == to {
            return Ok(ExchangeRate::identity(from.clone()));
        }

        let pair = (from.clone(), to.clone());
        if let Some(rate) = self.cached(&pair).await {
            return Ok(rate);
        }

        let gate = FetchGate::enter(&self.inflight, &pair);
        let _guard = gate.lock().await;
        self.refresh(&pair).await
    }

    /// Fetches the base table for a missing pair; runs under the pair's gate.
    async fn refresh(&self, pair: &Pair) -> Result<ExchangeRate, CurrencyError> {
        let (from, to) = pair;

        // Another caller may have filled the cache while we waited.
        if let Some(rate) = self.cached(pair).await {
            return Ok(rate);
        }

        let table = self.source.latest(from).await.map_err(|e| {
            tracing::warn!(from = %from, to = %to, error = %e, "exchange rate fetch failed");
            e
        })?;
        let fetched_at = Timestamp::now();

        let mut cache = self.cache.write().await;
        for (code, rate) in &table.rates {
            if let Ok(quote) = Currency::new(code) {
                cache.insert(
                    (from.clone(), quote.clone()),
                    ExchangeRate {
                        from: from.clone(),
                        to: quote,
                        rate: *rate,
                        fetched_at,
                    },
                );
            }
        }
        tracing::debug!(base = %from, pairs = table.rates.len(), "exchange rates refreshed");

        cache.get(pair).cloned().ok_or_else(|| {
            CurrencyError::rate_unavailable(from.as_str(), to.as_str(), "pair not quoted by source")
        })
    }

    /// Converts `amount` and rounds the result to two decimals.
    pub async fn convert(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
    ) -> Result<Conversion, CurrencyError> {
        let amount = validate_amount(amount)?;
        let rate = self.rate(from, to).await?;

        Ok(Conversion {
            from_currency: from.clone(),
            to_currency: to.clone(),
            original_amount: amount,
            converted_amount: apply_rate(amount, &rate)?,
            rate: rate.rate,
        })
    }

    async fn cached(&self, pair: &Pair) -> Option<ExchangeRate> {
        let cache = self.cache.read().await;
        cache
            .get(pair)
            .filter(|rate| rate.is_fresh(self.ttl_secs, Timestamp::now()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RateTable;
    use async_trait::async_trait;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockRateSource {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl MockRateSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ExchangeRateSource for MockRateSource {
        async fn latest(&self, base: &Currency) -> Result<RateTable, CurrencyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(CurrencyError::rate_unavailable(base.as_str(), "*", "down"));
            }
            let mut rates = HashMap::new();
            rates.insert("EUR".to_string(), dec("0.9234"));
            rates.insert("IDR".to_string(), dec("16250.5"));
            Ok(RateTable {
                base: base.clone(),
                rates,
            })
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn usd() -> Currency {
        Currency::usd()
    }

    fn eur() -> Currency {
        Currency::new("EUR").unwrap()
    }

    #[tokio::test]
    async fn converts_and_rounds() {
        let converter = CurrencyConverter::new(Arc::new(MockRateSource::new()), 3600);

        let conversion = converter.convert(dec("47.00"), &usd(), &eur()).await.unwrap();

        assert_eq!(conversion.rate, dec("0.9234"));
        assert_eq!(conversion.converted_amount, dec("43.40"));
        assert_eq!(conversion.original_amount, dec("47.00"));
    }

    #[tokio::test]
    async fn same_currency_skips_source() {
        let source = Arc::new(MockRateSource::new());
        let converter = CurrencyConverter::new(source.clone(), 3600);

        let conversion = converter.convert(dec("12.345"), &usd(), &usd()).await.unwrap();

        assert_eq!(conversion.converted_amount, dec("12.345"));
        assert_eq!(conversion.rate, Decimal::ONE);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn cached_rate_is_reused_within_ttl() {
        let source = Arc::new(MockRateSource::new());
        let converter = CurrencyConverter::new(source.clone(), 3600);

        converter.rate(&usd(), &eur()).await.unwrap();
        converter.rate(&usd(), &eur()).await.unwrap();
        converter
            .rate(&usd(), &Currency::new("IDR").unwrap())
            .await
            .unwrap();

        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn expired_rate_is_refetched() {
        let source = Arc::new(MockRateSource::new());
        let converter = CurrencyConverter::new(source.clone(), 0);

        converter.rate(&usd(), &eur()).await.unwrap();
        converter.rate(&usd(), &eur()).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let source = Arc::new(MockRateSource {
            delay: Duration::from_millis(20),
            ..MockRateSource::new()
        });
        let converter = Arc::new(CurrencyConverter::new(source.clone(), 3600));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let converter = converter.clone();
                tokio::spawn(async move { converter.rate(&usd(), &eur()).await })
            })
            .collect();
        for result in futures::future::join_all(tasks).await {
            assert!(result.unwrap().is_ok());
        }

        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn source_failure_is_rate_unavailable() {
        let source = Arc::new(MockRateSource {
            fail: true,
            ..MockRateSource::new()
        });
        let converter = CurrencyConverter::new(source, 3600);

        let err = converter.convert(dec("1"), &usd(), &eur()).await.unwrap_err();

        assert!(matches!(err, CurrencyError::RateUnavailable { .. }));
    }

    #[tokio::test]
    async fn unquoted_pair_is_rate_unavailable() {
        let converter = CurrencyConverter::new(Arc::new(MockRateSource::new()), 3600);

        let err = converter
            .rate(&usd(), &Currency::new("GBP").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, CurrencyError::RateUnavailable { .. }));
    }

    #[tokio::test]
    async fn fetch_gates_are_released() {
        let converter = CurrencyConverter::new(Arc::new(MockRateSource::new()), 3600);

        for code in ["AAA", "AAB", "AAC", "AAD", "AAE"] {
            let to = Currency::new(code).unwrap();
            assert!(converter.rate(&usd(), &to).await.is_err());
        }
        converter.rate(&usd(), &eur()).await.unwrap();

        assert_eq!(converter.inflight.len(), 0);
    }

    #[tokio::test]
    async fn concurrent_fetch_gates_are_released() {
        let source = Arc::new(MockRateSource {
            delay: Duration::from_millis(20),
            ..MockRateSource::new()
        });
        let converter = Arc::new(CurrencyConverter::new(source, 3600));

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let converter = converter.clone();
                tokio::spawn(async move { converter.rate(&usd(), &eur()).await })
            })
            .collect();
        futures::future::join_all(tasks).await;

        assert_eq!(converter.inflight.len(), 0);
    }

    #[tokio::test]
    async fn cancelled_fetch_releases_its_gate() {
        let source = Arc::new(MockRateSource {
            delay: Duration::from_millis(100),
            ..MockRateSource::new()
        });
        let converter = CurrencyConverter::new(source, 3600);

        let aborted =
            tokio::time::timeout(Duration::from_millis(5), converter.rate(&usd(), &eur())).await;

        assert!(aborted.is_err());
        assert_eq!(converter.inflight.len(), 0);
    }

    #[tokio::test]
    async fn overflowing_amount_is_validation_error() {
        let converter = CurrencyConverter::new(Arc::new(MockRateSource::new()), 3600);
        let idr = Currency::new("IDR").unwrap();

        let err = converter
            .convert(dec("79228162514264337593543950335"), &usd(), &idr)
            .await
            .unwrap_err();

        assert!(matches!(err, CurrencyError::Validation(_)));
    }

    #[tokio::test]
    async fn negative_amount_is_rejected() {
        let converter = CurrencyConverter::new(Arc::new(MockRateSource::new()), 3600);

        let err = converter.convert(dec("-1"), &usd(), &eur()).await.unwrap_err();

        assert!(matches!(err, CurrencyError::Validation(_)));
    }
}
