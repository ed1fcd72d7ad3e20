//! Card processor adapter (Stripe API).
//!
//! Creates a payment intent at the processor and hands the client secret
//! back to the storefront, which confirms the card in the browser. The
//! intent's idempotency key is forwarded as Stripe's `Idempotency-Key`
//! header, so a replayed create never produces a second charge.
//!
//! # Callbacks
//!
//! | Event type                        | Outcome     |
//! |-----------------------------------|-------------|
//! | `payment_intent.succeeded`        | succeeded   |
//! | `payment_intent.payment_failed`   | failed      |
//! | `payment_intent.canceled`         | failed      |
//! | `payment_intent.processing`       | pending     |
//! | anything else                     | ignored     |

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::http_support::{build_client, network_error, read_json};
use crate::config::CardProviderConfig;
use crate::domain::payment::{CheckoutDetails, ProviderKind};
use crate::domain::webhook::{
    required_str, CallbackOutcome, CallbackParser, ProviderCallback, WebhookError,
};
use crate::ports::{ProviderAdapter, ProviderError, ProviderPayment, ProviderPaymentRequest};

const PROVIDER: &str = "card";

/// Card processor adapter.
pub struct CardAdapter {
    secret_key: Secret<String>,
    api_base_url: String,
    http_client: reqwest::Client,
}

/// Subset of Stripe's PaymentIntent object we read.
#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
    status: String,
}

impl CardAdapter {
    pub fn new(config: &CardProviderConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            secret_key: config.secret_key.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http_client: build_client(timeout)?,
        })
    }

    fn form_params(request: &ProviderPaymentRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("amount".to_string(), request.amount_minor_units.to_string()),
            (
                "currency".to_string(),
                request.currency.as_str().to_ascii_lowercase(),
            ),
            ("receipt_email".to_string(), request.customer_email.clone()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
            (
                "metadata[intent_id]".to_string(),
                request.intent_id.to_string(),
            ),
        ];
        for (key, value) in &request.metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }
        params
    }
}

#[async_trait]
impl ProviderAdapter for CardAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Card
    }

    async fn create(
        &self,
        request: &ProviderPaymentRequest,
    ) -> Result<ProviderPayment, ProviderError> {
        let url = format!("{}/v1/payment_intents", self.api_base_url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.secret_key.expose_secret(), Option::<&str>::None)
            .header("Idempotency-Key", request.idempotency_key.as_str())
            .form(&Self::form_params(request))
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        let intent: StripePaymentIntent = read_json(PROVIDER, response).await?;

        tracing::debug!(
            intent_id = %request.intent_id,
            external_id = %intent.id,
            status = %intent.status,
            "card payment intent created"
        );

        Ok(ProviderPayment {
            synchronous: intent.status == "succeeded",
            external_id: intent.id,
            checkout: CheckoutDetails {
                client_secret: intent.client_secret,
                ..Default::default()
            },
        })
    }
}

impl CallbackParser for CardAdapter {
    fn parse_callback(&self, payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
        parse_card_callback(payload)
    }
}

fn parse_card_callback(payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
    let event_id = required_str(payload, "/id")?;
    let event_type = required_str(payload, "/type")?;

    let outcome = match event_type {
        "payment_intent.succeeded" => CallbackOutcome::Succeeded,
        "payment_intent.payment_failed" | "payment_intent.canceled" => CallbackOutcome::Failed,
        "payment_intent.processing" => CallbackOutcome::Pending,
        _ => return Ok(ProviderCallback::ignored(event_id, event_type)),
    };

    Ok(ProviderCallback {
        event_id: event_id.to_string(),
        event_type: event_type.to_string(),
        external_id: Some(required_str(payload, "/data/object/id")?.to_string()),
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Currency, IdempotencyKey, IntentId};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn event(event_type: &str) -> serde_json::Value {
        json!({
            "id": "evt_1",
            "type": event_type,
            "data": { "object": { "id": "pi_123", "object": "payment_intent" } }
        })
    }

    #[test]
    fn succeeded_event_maps_to_succeeded() {
        let callback = parse_card_callback(&event("payment_intent.succeeded")).unwrap();
        assert_eq!(callback.event_id, "evt_1");
        assert_eq!(callback.external_id.as_deref(), Some("pi_123"));
        assert_eq!(callback.outcome, CallbackOutcome::Succeeded);
    }

    #[test]
    fn failure_and_cancel_map_to_failed() {
        for event_type in ["payment_intent.payment_failed", "payment_intent.canceled"] {
            let callback = parse_card_callback(&event(event_type)).unwrap();
            assert_eq!(callback.outcome, CallbackOutcome::Failed);
        }
    }

    #[test]
    fn unrelated_event_is_ignored() {
        let callback = parse_card_callback(&event("customer.created")).unwrap();
        assert_eq!(callback.outcome, CallbackOutcome::Ignored);
        assert!(callback.external_id.is_none());
    }

    #[test]
    fn missing_object_id_is_malformed() {
        let payload = json!({ "id": "evt_1", "type": "payment_intent.succeeded", "data": {} });
        assert!(matches!(
            parse_card_callback(&payload),
            Err(WebhookError::MalformedPayload(_))
        ));
    }

    #[test]
    fn form_params_carry_amount_and_metadata() {
        let mut metadata = BTreeMap::new();
        metadata.insert("order".to_string(), "A-17".to_string());
        let request = ProviderPaymentRequest {
            intent_id: IntentId::new(),
            idempotency_key: IdempotencyKey::new("k1").unwrap(),
            amount_minor_units: 4700,
            currency: Currency::usd(),
            customer_email: "buyer@example.com".to_string(),
            method: None,
            country: None,
            metadata,
        };

        let params = CardAdapter::form_params(&request);

        assert!(params.contains(&("amount".to_string(), "4700".to_string())));
        assert!(params.contains(&("currency".to_string(), "usd".to_string())));
        assert!(params.contains(&("metadata[order]".to_string(), "A-17".to_string())));
    }
}
