//! Shared plumbing for provider HTTP calls.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::domain::foundation::Currency;
use crate::ports::{ProviderError, ProviderErrorCode};

/// Builds the HTTP client used by one adapter.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Maps a transport failure to a retryable network error.
pub fn network_error(provider: &str, err: reqwest::Error) -> ProviderError {
    tracing::warn!(provider, error = %err, "provider request failed");
    ProviderError::network(format!("{} request failed: {}", provider, err))
}

/// Reads a JSON body, turning non-2xx answers into provider errors.
pub async fn read_json<T: DeserializeOwned>(
    provider: &str,
    response: Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!(provider, status = status.as_u16(), body = %body, "provider API error");
        return Err(error_for_status(provider, status, &body));
    }

    response.json::<T>().await.map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse {} response: {}", provider, e))
    })
}

fn error_for_status(provider: &str, status: StatusCode, body: &str) -> ProviderError {
    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderErrorCode::AuthenticationError,
        StatusCode::PAYMENT_REQUIRED => ProviderErrorCode::Declined,
        StatusCode::TOO_MANY_REQUESTS => ProviderErrorCode::RateLimitExceeded,
        _ => ProviderErrorCode::ProviderError,
    };
    ProviderError::new(code, format!("{} API error ({}): {}", provider, status.as_u16(), body))
        .with_provider_code(status.as_u16().to_string())
}

/// Decimal string of an amount in major units, at the currency's precision.
pub fn major_units_string(currency: &Currency, minor_units: i64) -> String {
    let precision = currency.minor_unit_exponent() as usize;
    format!("{:.*}", precision, currency.to_major_units(minor_units))
}

/// Reads a JSON field that providers send either as a string or a number.
pub fn string_or_number(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn major_units_follow_currency_precision() {
        assert_eq!(major_units_string(&Currency::usd(), 4700), "47.00");
        assert_eq!(major_units_string(&Currency::new("JPY").unwrap(), 4700), "4700");
    }

    #[test]
    fn status_codes_map_to_error_codes() {
        let err = error_for_status("card", StatusCode::UNAUTHORIZED, "bad key");
        assert_eq!(err.code, ProviderErrorCode::AuthenticationError);
        assert_eq!(err.provider_code.as_deref(), Some("401"));

        let err = error_for_status("card", StatusCode::TOO_MANY_REQUESTS, "");
        assert!(err.retryable);

        let err = error_for_status("card", StatusCode::BAD_REQUEST, "amount too small");
        assert_eq!(err.code, ProviderErrorCode::ProviderError);
        assert!(err.message.contains("amount too small"));
    }

    #[test]
    fn string_or_number_accepts_both() {
        assert_eq!(string_or_number(&json!(123)), Some("123".to_string()));
        assert_eq!(string_or_number(&json!("abc")), Some("abc".to_string()));
        assert_eq!(string_or_number(&json!("")), None);
        assert_eq!(string_or_number(&json!(null)), None);
    }
}
