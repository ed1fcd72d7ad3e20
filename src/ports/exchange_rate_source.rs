//! Exchange rate source port.
//!
//! A source quotes every rate it knows for one base currency in a single
//! call; the converter caches the result per pair.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::domain::currency::CurrencyError;
use crate::domain::foundation::Currency;

/// Rates quoted against one base currency.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub base: Currency,
    /// Keyed by upper-case ISO code.
    pub rates: HashMap<String, Decimal>,
}

impl RateTable {
    pub fn rate_for(&self, to: &Currency) -> Option<Decimal> {
        self.rates.get(to.as_str()).copied()
    }
}

#[async_trait]
pub trait ExchangeRateSource: Send + Sync {
    /// Fetch all rates for `base`.
    ///
    /// Fails with `CurrencyError::RateUnavailable` on transport or parse
    /// failure.
    async fn latest(&self, base: &Currency) -> Result<RateTable, CurrencyError>;
}
