//! Currency conversion configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Exchange rate source and cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    /// Base URL of the exchangerate-api style rate service
    #[serde(default = "default_rate_api_base_url")]
    pub rate_api_base_url: String,

    /// How long a fetched rate is served from cache
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// HTTP timeout for rate fetches
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl CurrencyConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.rate_api_base_url.starts_with("http://")
            && !self.rate_api_base_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidUrl("currency.rate_api_base_url"));
        }
        if self.cache_ttl_secs == 0 || self.cache_ttl_secs > 86_400 {
            return Err(ValidationError::InvalidRateCacheTtl);
        }
        if self.fetch_timeout_secs == 0 || self.fetch_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            rate_api_base_url: default_rate_api_base_url(),
            cache_ttl_secs: default_cache_ttl(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_rate_api_base_url() -> String {
    "https://api.exchangerate-api.com".to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_fetch_timeout() -> u64 {
    10
}
