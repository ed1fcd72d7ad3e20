//! Payment provider port for external payment processing.
//!
//! Each processor the storefront routes to (card, wallet, crypto, regional,
//! bank transfer) sits behind one [`ProviderAdapter`]. Adapters translate a
//! generic payment request into the provider's create call and translate the
//! provider's callbacks back into a [`ProviderCallback`].
//!
//! # Design
//!
//! - **Gateway agnostic**: the orchestrator never sees vendor formats
//! - **Idempotent**: the intent's idempotency key is forwarded where the
//!   provider supports it, so a retried create cannot double-charge

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::{Currency, IdempotencyKey, IntentId};
use crate::domain::payment::{CheckoutDetails, PaymentIntent, ProviderKind, RegionalMethod};
use crate::domain::webhook::CallbackParser;

/// Port for payment provider integrations.
#[async_trait]
pub trait ProviderAdapter: CallbackParser {
    /// Which provider this adapter serves.
    fn kind(&self) -> ProviderKind;

    /// Create the payment at the provider.
    ///
    /// Returns the provider reference and whatever the buyer needs to
    /// complete the payment (redirect, client secret, instructions).
    async fn create(&self, request: &ProviderPaymentRequest)
        -> Result<ProviderPayment, ProviderError>;

    /// Whether the provider delivers callbacks at all.
    fn accepts_callbacks(&self) -> bool {
        true
    }

    /// Whether `create` can serve this sub-method.
    ///
    /// Checked before an intent is stored, so a request for an
    /// unintegrated method never leaves a failed intent behind.
    fn supports_method(&self, method: Option<RegionalMethod>) -> bool {
        method.is_none()
    }
}

/// Request to create a payment at a provider.
#[derive(Debug, Clone)]
pub struct ProviderPaymentRequest {
    /// Our intent id, sent as the provider-side order reference.
    pub intent_id: IntentId,

    /// Forwarded to providers that support idempotent creates.
    pub idempotency_key: IdempotencyKey,

    pub amount_minor_units: i64,
    pub currency: Currency,
    pub customer_email: String,
    pub method: Option<RegionalMethod>,
    pub country: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl From<&PaymentIntent> for ProviderPaymentRequest {
    fn from(intent: &PaymentIntent) -> Self {
        Self {
            intent_id: intent.id,
            idempotency_key: intent.idempotency_key.clone(),
            amount_minor_units: intent.amount_minor_units,
            currency: intent.currency.clone(),
            customer_email: intent.customer_email.clone(),
            method: intent.method,
            country: intent.country.clone(),
            metadata: intent.metadata.clone(),
        }
    }
}

/// Provider's answer to a create call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPayment {
    /// Provider's reference for the payment; callbacks carry it.
    pub external_id: String,

    pub checkout: CheckoutDetails,

    /// True when the charge settled during the create call.
    pub synchronous: bool,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderError {
    /// Error code for categorization.
    pub code: ProviderErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl ProviderError {
    /// Create a new provider error.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationError, message)
    }

    /// Create a declined error.
    pub fn declined(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Declined, message)
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: impl std::fmt::Display) -> Self {
        Self::new(
            ProviderErrorCode::UnsupportedMethod,
            format!("payment method '{}' is not integrated", method),
        )
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Create a generic provider API error.
    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Provider error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Payment was declined.
    Declined,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Method is listed but has no integration.
    UnsupportedMethod,

    /// Provider answered with something we could not read.
    InvalidResponse,

    /// Provider API error.
    ProviderError,
}

impl ProviderErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorCode::NetworkError | ProviderErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderErrorCode::NetworkError => "network_error",
            ProviderErrorCode::AuthenticationError => "authentication_error",
            ProviderErrorCode::Declined => "declined",
            ProviderErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            ProviderErrorCode::UnsupportedMethod => "unsupported_method",
            ProviderErrorCode::InvalidResponse => "invalid_response",
            ProviderErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::payment::IntentDraft;

    #[test]
    fn network_errors_are_retryable() {
        assert!(ProviderError::network("connection reset").retryable);
        assert!(!ProviderError::declined("insufficient funds").retryable);
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = ProviderError::declined("card declined").with_provider_code("card_declined");
        assert_eq!(err.to_string(), "declined: card declined");
        assert_eq!(err.provider_code.as_deref(), Some("card_declined"));
    }

    #[test]
    fn unsupported_method_names_method() {
        let err = ProviderError::unsupported_method(RegionalMethod::Boleto);
        assert_eq!(err.code, ProviderErrorCode::UnsupportedMethod);
        assert!(err.message.contains("boleto"));
    }

    #[test]
    fn request_copies_intent_fields() {
        let intent = PaymentIntent::create(
            IntentDraft {
                idempotency_key: IdempotencyKey::new("order-9").unwrap(),
                provider: ProviderKind::Card,
                method: None,
                country: None,
                amount_minor_units: 1999,
                currency: Currency::usd(),
                customer_email: "buyer@example.com".into(),
                metadata: BTreeMap::new(),
            },
            Timestamp::now(),
        );

        let request = ProviderPaymentRequest::from(&intent);

        assert_eq!(request.intent_id, intent.id);
        assert_eq!(request.idempotency_key.as_str(), "order-9");
        assert_eq!(request.amount_minor_units, 1999);
    }
}
