//! Crypto processor adapter (CoinGate API).
//!
//! Orders are priced in the intent's currency and settled in the configured
//! receive currency. The processor posts status changes to
//! `<public base>/webhooks/crypto`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::http_support::{
    build_client, major_units_string, network_error, read_json, string_or_number,
};
use crate::config::CryptoProviderConfig;
use crate::domain::payment::{CheckoutDetails, ProviderKind};
use crate::domain::webhook::{
    required_str, CallbackOutcome, CallbackParser, ProviderCallback, WebhookError,
};
use crate::ports::{ProviderAdapter, ProviderError, ProviderPayment, ProviderPaymentRequest};

const PROVIDER: &str = "crypto";

#[derive(Debug, Deserialize)]
struct CoinGateOrder {
    id: serde_json::Value,
    payment_url: Option<String>,
    status: Option<String>,
}

/// Crypto processor adapter.
pub struct CryptoAdapter {
    api_token: Secret<String>,
    api_base_url: String,
    receive_currency: String,
    public_base_url: String,
    http_client: reqwest::Client,
}

impl CryptoAdapter {
    pub fn new(
        config: &CryptoProviderConfig,
        public_base_url: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            api_token: config.api_token.clone(),
            api_base_url: config.api_base_url().trim_end_matches('/').to_string(),
            receive_currency: config.receive_currency.clone(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            http_client: build_client(timeout)?,
        })
    }

    fn order_params(&self, request: &ProviderPaymentRequest) -> Vec<(&'static str, String)> {
        let intent_id = request.intent_id.to_string();
        vec![
            ("order_id", intent_id.clone()),
            (
                "price_amount",
                major_units_string(&request.currency, request.amount_minor_units),
            ),
            ("price_currency", request.currency.as_str().to_string()),
            ("receive_currency", self.receive_currency.clone()),
            ("title", format!("Order {}", intent_id)),
            (
                "callback_url",
                format!("{}/webhooks/crypto", self.public_base_url),
            ),
            (
                "success_url",
                format!("{}/checkout/return?intent={}", self.public_base_url, intent_id),
            ),
            (
                "cancel_url",
                format!("{}/checkout/cancel?intent={}", self.public_base_url, intent_id),
            ),
            ("purchaser_email", request.customer_email.clone()),
        ]
    }
}

#[async_trait]
impl ProviderAdapter for CryptoAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Crypto
    }

    async fn create(
        &self,
        request: &ProviderPaymentRequest,
    ) -> Result<ProviderPayment, ProviderError> {
        let response = self
            .http_client
            .post(format!("{}/v2/orders", self.api_base_url))
            .header(
                "Authorization",
                format!("Token {}", self.api_token.expose_secret()),
            )
            .form(&self.order_params(request))
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        let order: CoinGateOrder = read_json(PROVIDER, response).await?;
        let external_id = string_or_number(&order.id)
            .ok_or_else(|| ProviderError::invalid_response("crypto order has no id"))?;
        let payment_url = order
            .payment_url
            .ok_or_else(|| ProviderError::invalid_response("crypto order has no payment_url"))?;

        tracing::debug!(
            intent_id = %request.intent_id,
            external_id = %external_id,
            status = ?order.status,
            "crypto order created"
        );

        Ok(ProviderPayment {
            external_id,
            checkout: CheckoutDetails {
                redirect_url: Some(payment_url),
                ..Default::default()
            },
            synchronous: false,
        })
    }
}

impl CallbackParser for CryptoAdapter {
    fn parse_callback(&self, payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
        parse_crypto_callback(payload)
    }
}

/// CoinGate posts the whole order on every status change, so the event id
/// is the order id combined with the status.
fn parse_crypto_callback(payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
    let order_id = payload
        .get("id")
        .and_then(string_or_number)
        .ok_or_else(|| WebhookError::MalformedPayload("missing field /id".to_string()))?;
    let status = required_str(payload, "/status")?;

    let outcome = match status {
        "paid" => CallbackOutcome::Succeeded,
        "invalid" | "expired" | "canceled" => CallbackOutcome::Failed,
        "new" | "pending" | "confirming" => CallbackOutcome::Pending,
        _ => CallbackOutcome::Ignored,
    };

    Ok(ProviderCallback {
        event_id: format!("{}:{}", order_id, status),
        event_type: status.to_string(),
        external_id: (outcome != CallbackOutcome::Ignored).then_some(order_id),
        outcome,
    })
}
