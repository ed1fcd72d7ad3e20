//! exchangerate-api style HTTP rate source.
//!
//! `GET <base>/v4/latest/<FROM>` answers `{"base": "USD", "rates": {"EUR": 0.92, ...}}`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::CurrencyConfig;
use crate::domain::currency::CurrencyError;
use crate::domain::foundation::Currency;
use crate::ports::{ExchangeRateSource, RateTable};

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, Decimal>,
}

/// HTTP rate source.
pub struct ExchangeRateApiSource {
    base_url: String,
    http_client: reqwest::Client,
}

impl ExchangeRateApiSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn from_config(config: &CurrencyConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.rate_api_base_url.clone(), config.fetch_timeout())
    }
}

#[async_trait]
impl ExchangeRateSource for ExchangeRateApiSource {
    async fn latest(&self, base: &Currency) -> Result<RateTable, CurrencyError> {
        let url = format!("{}/v4/latest/{}", self.base_url, base.as_str());
        let unavailable = |reason: String| CurrencyError::rate_unavailable(base.as_str(), "*", reason);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(format!("rate request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(base = %base, status = status.as_u16(), "rate source returned an error");
            return Err(unavailable(format!("rate source answered {}", status)));
        }

        let body: LatestRatesResponse = response
            .json()
            .await
            .map_err(|e| unavailable(format!("failed to parse rates: {}", e)))?;

        let rates = body
            .rates
            .into_iter()
            .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
            .collect();

        Ok(RateTable {
            base: base.clone(),
            rates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_numeric_rates() {
        let body: LatestRatesResponse = serde_json::from_str(
            r#"{"base":"USD","date":"2024-05-01","rates":{"EUR":0.9234,"JPY":155.1}}"#,
        )
        .unwrap();

        assert_eq!(body.rates["EUR"], Decimal::from_str("0.9234").unwrap());
        assert_eq!(body.rates["JPY"], Decimal::from_str("155.1").unwrap());
    }

    #[test]
    fn base_url_is_trimmed() {
        let source =
            ExchangeRateApiSource::new("https://rates.example/", Duration::from_secs(1)).unwrap();
        assert_eq!(source.base_url, "https://rates.example");
    }
}
