//! Request and response types for the payment endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::payment::{IntentStatus, PaymentIntent, ProviderKind, RegionalMethod};

/// Body of `POST /payments`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    /// Falls back to the `Idempotency-Key` header when absent.
    #[serde(default)]
    pub idempotency_key: Option<String>,
    pub provider: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Amount in minor units of `currency`.
    #[serde(alias = "amountMinorUnits")]
    pub amount: i64,
    pub currency: String,
    pub customer_email: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Intent as returned to the storefront.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub intent_id: String,
    pub status: IntentStatus,
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<RegionalMethod>,
    pub amount_minor_units: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PaymentIntent> for PaymentResponse {
    fn from(intent: PaymentIntent) -> Self {
        Self {
            intent_id: intent.id.to_string(),
            status: intent.status,
            provider: intent.provider,
            method: intent.method,
            amount_minor_units: intent.amount_minor_units,
            currency: intent.currency.to_string(),
            redirect_url: intent.checkout.redirect_url,
            client_secret: intent.checkout.client_secret,
            instructions: intent.checkout.instructions,
            failure_reason: intent.failure_reason,
            created_at: intent.created_at.to_rfc3339(),
            updated_at: intent.updated_at.to_rfc3339(),
        }
    }
}

/// Acknowledgement sent to providers.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}
