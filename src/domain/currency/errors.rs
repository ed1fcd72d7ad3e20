//! Currency conversion errors.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Rate source failed or did not quote the pair.
    #[error("Exchange rate {from}/{to} unavailable: {reason}")]
    RateUnavailable {
        from: String,
        to: String,
        reason: String,
    },
}

impl CurrencyError {
    pub fn rate_unavailable(
        from: impl Into<String>,
        to: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CurrencyError::RateUnavailable {
            from: from.into(),
            to: to.into(),
            reason: reason.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CurrencyError::Validation(_) => StatusCode::BAD_REQUEST,
            CurrencyError::RateUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<CurrencyError> for DomainError {
    fn from(err: CurrencyError) -> Self {
        match err {
            CurrencyError::Validation(inner) => inner.into(),
            CurrencyError::RateUnavailable { ref from, ref to, .. } => {
                let (from, to) = (from.clone(), to.clone());
                DomainError::new(ErrorCode::RateUnavailable, err.to_string())
                    .with_detail("from", from)
                    .with_detail("to", to)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_unavailable_is_503() {
        let err = CurrencyError::rate_unavailable("USD", "IDR", "timeout");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            err.to_string(),
            "Exchange rate USD/IDR unavailable: timeout"
        );
    }

    #[test]
    fn domain_error_names_the_pair() {
        let domain: DomainError = CurrencyError::rate_unavailable("USD", "IDR", "timeout").into();
        assert_eq!(domain.code, ErrorCode::RateUnavailable);
        assert_eq!(domain.details.get("to"), Some(&"IDR".to_string()));
    }

    #[test]
    fn validation_is_400() {
        let err: CurrencyError = ValidationError::empty_field("amount").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
