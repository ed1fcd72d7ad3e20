//! Webhook error types.
//!
//! Defines all error conditions that can occur while accepting a provider
//! callback, with HTTP status code mapping and retryability semantics.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature header absent.
    #[error("Missing signature header")]
    MissingSignature,

    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signed timestamp is older than the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signed timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Body or signature header could not be parsed.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// No adapter is registered for the provider in the URL.
    #[error("Payment provider '{0}' is not available")]
    UnsupportedProvider(String),

    /// Provider does not deliver callbacks (bank transfers are reconciled manually).
    #[error("Provider '{0}' does not accept callbacks")]
    CallbacksNotAccepted(String),

    /// No intent carries the referenced provider id.
    #[error("No payment intent for provider reference '{0}'")]
    IntentNotFound(String),

    /// Attempted state transition is not valid.
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    /// Intent or processed-event storage failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WebhookError {
    /// Returns true if the provider should redeliver this callback.
    ///
    /// Retryable errors indicate temporary failures that may succeed
    /// on subsequent attempts (storage issues, eventual consistency).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Storage(_) | WebhookError::IntentNotFound(_) // create may still be persisting
        )
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp => ErrorCode::InvalidSignature,
            WebhookError::MalformedPayload(_) => ErrorCode::MalformedPayload,
            WebhookError::UnsupportedProvider(_) | WebhookError::CallbacksNotAccepted(_) => {
                ErrorCode::UnsupportedProvider
            }
            WebhookError::IntentNotFound(_) => ErrorCode::IntentNotFound,
            WebhookError::InvalidTransition(_) => ErrorCode::InvalidStateTransition,
            WebhookError::Storage(_) => ErrorCode::StorageError,
        }
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes determine provider retry behavior:
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Client error, no retry
    /// - 5xx: Server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::MalformedPayload(_)
            | WebhookError::UnsupportedProvider(_)
            | WebhookError::CallbacksNotAccepted(_) => StatusCode::BAD_REQUEST,

            WebhookError::IntentNotFound(_)
            | WebhookError::InvalidTransition(_)
            | WebhookError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WebhookError> for DomainError {
    fn from(err: WebhookError) -> Self {
        let retryable = err.is_retryable();
        let domain = DomainError::new(err.code(), err.to_string());
        if retryable {
            domain.with_detail("retryable", "true")
        } else {
            domain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_failures_are_bad_request() {
        for err in [
            WebhookError::MissingSignature,
            WebhookError::InvalidSignature,
            WebhookError::TimestampOutOfRange,
            WebhookError::InvalidTimestamp,
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.code(), ErrorCode::InvalidSignature);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn malformed_payload_is_bad_request() {
        let err = WebhookError::MalformedPayload("expected value".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), ErrorCode::MalformedPayload);
    }

    #[test]
    fn unknown_intent_is_retryable_server_error() {
        let err = WebhookError::IntentNotFound("pi_123".into());
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn storage_error_is_retryable() {
        assert!(WebhookError::Storage("connection reset".into()).is_retryable());
    }

    #[test]
    fn invalid_transition_is_not_retryable() {
        let err = WebhookError::InvalidTransition("Succeeded to Pending".into());
        assert!(!err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn domain_error_marks_retryable() {
        let domain: DomainError = WebhookError::Storage("down".into()).into();
        assert_eq!(domain.details.get("retryable"), Some(&"true".to_string()));

        let domain: DomainError = WebhookError::InvalidSignature.into();
        assert!(domain.details.is_empty());
    }
}
