//! Errors raised while creating or reading payment intents.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{
    DomainError, ErrorCode, IntentId, TransitionError, ValidationError,
};

/// Errors from the checkout side of the orchestrator.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Request failed field validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Provider is unknown or not configured in this deployment.
    #[error("Payment provider '{0}' is not available")]
    UnsupportedProvider(String),

    /// Regional method has no integration.
    #[error("Payment method '{0}' is not supported")]
    UnsupportedMethod(String),

    /// No intent with this id.
    #[error("Payment intent {0} not found")]
    NotFound(IntentId),

    /// Provider rejected or failed the create call; the intent is now failed.
    #[error("Payment provider error: {message}")]
    Provider { intent_id: IntentId, message: String },

    /// A status change broke the forward-only ordering.
    #[error("Invalid state transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    /// Intent storage failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Background task failed unexpectedly.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::Validation(_) => ErrorCode::ValidationFailed,
            PaymentError::UnsupportedProvider(_) => ErrorCode::UnsupportedProvider,
            PaymentError::UnsupportedMethod(_) => ErrorCode::UnsupportedMethod,
            PaymentError::NotFound(_) => ErrorCode::IntentNotFound,
            PaymentError::Provider { .. } => ErrorCode::ProviderError,
            PaymentError::InvalidTransition(_) => ErrorCode::InvalidStateTransition,
            PaymentError::Storage(_) => ErrorCode::StorageError,
            PaymentError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Maps the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::Validation(_)
            | PaymentError::UnsupportedProvider(_)
            | PaymentError::UnsupportedMethod(_) => StatusCode::BAD_REQUEST,
            PaymentError::NotFound(_) => StatusCode::NOT_FOUND,
            PaymentError::Provider { .. } => StatusCode::PAYMENT_REQUIRED,
            PaymentError::InvalidTransition(_)
            | PaymentError::Storage(_)
            | PaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Validation(inner) => inner.into(),
            PaymentError::Provider { intent_id, message } => {
                DomainError::new(ErrorCode::ProviderError, message)
                    .with_detail("intentId", intent_id.to_string())
            }
            PaymentError::NotFound(id) => {
                DomainError::new(ErrorCode::IntentNotFound, "Payment intent not found")
                    .with_detail("intentId", id.to_string())
            }
            other => DomainError::new(other.code(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err: PaymentError = ValidationError::empty_field("customerEmail").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn unsupported_provider_is_client_error() {
        let err = PaymentError::UnsupportedProvider("crypto".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn provider_error_is_payment_required_and_names_intent() {
        let id = IntentId::new();
        let err = PaymentError::Provider {
            intent_id: id,
            message: "card declined".into(),
        };
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);

        let domain: DomainError = err.into();
        assert_eq!(domain.code, ErrorCode::ProviderError);
        assert_eq!(domain.message, "card declined");
        assert_eq!(domain.details.get("intentId"), Some(&id.to_string()));
    }

    #[test]
    fn invalid_transition_is_server_error() {
        let err: PaymentError = TransitionError {
            from: "Succeeded".into(),
            to: "Pending".into(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_is_404() {
        assert_eq!(
            PaymentError::NotFound(IntentId::new()).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
