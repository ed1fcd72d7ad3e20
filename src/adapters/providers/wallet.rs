//! Wallet processor adapter (PayPal REST API).
//!
//! Creates a checkout order and redirects the buyer to the order's approval
//! link. Access tokens from the OAuth client-credentials grant are cached
//! until shortly before they expire.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use super::http_support::{build_client, major_units_string, network_error, read_json};
use crate::config::WalletProviderConfig;
use crate::domain::payment::{CheckoutDetails, ProviderKind};
use crate::domain::webhook::{
    required_str, CallbackOutcome, CallbackParser, ProviderCallback, WebhookError,
};
use crate::ports::{ProviderAdapter, ProviderError, ProviderPayment, ProviderPaymentRequest};

const PROVIDER: &str = "wallet";

/// Tokens are refreshed this long before PayPal says they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<OrderLink>,
}

#[derive(Debug, Deserialize)]
struct OrderLink {
    href: String,
    rel: String,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Wallet processor adapter.
pub struct WalletAdapter {
    client_id: String,
    client_secret: Secret<String>,
    api_base_url: String,
    return_base_url: String,
    http_client: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
}

impl WalletAdapter {
    /// `return_base_url` is where the buyer lands after approving or cancelling.
    pub fn new(
        config: &WalletProviderConfig,
        return_base_url: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_base_url: config.api_base_url().trim_end_matches('/').to_string(),
            return_base_url: return_base_url.trim_end_matches('/').to_string(),
            http_client: build_client(timeout)?,
            token: RwLock::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        {
            let cache = self.token.read().await;
            if let Some(ref cached) = *cache {
                if Instant::now() < cached.expires_at {
                    return Ok(cached.token.clone());
                }
            }
        }

        let response = self
            .http_client
            .post(format!("{}/v1/oauth2/token", self.api_base_url))
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;
        let fresh: TokenResponse = read_json(PROVIDER, response).await?;

        let lifetime = Duration::from_secs(fresh.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        let mut cache = self.token.write().await;
        *cache = Some(CachedToken {
            token: fresh.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(fresh.access_token)
    }

    fn order_body(&self, request: &ProviderPaymentRequest) -> serde_json::Value {
        json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": request.intent_id.to_string(),
                "custom_id": request.intent_id.to_string(),
                "amount": {
                    "currency_code": request.currency.as_str(),
                    "value": major_units_string(&request.currency, request.amount_minor_units),
                },
            }],
            "application_context": {
                "return_url": format!("{}/checkout/return?intent={}", self.return_base_url, request.intent_id),
                "cancel_url": format!("{}/checkout/cancel?intent={}", self.return_base_url, request.intent_id),
                "user_action": "PAY_NOW",
            },
        })
    }
}

#[async_trait]
impl ProviderAdapter for WalletAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Wallet
    }

    async fn create(
        &self,
        request: &ProviderPaymentRequest,
    ) -> Result<ProviderPayment, ProviderError> {
        let token = self.access_token().await?;

        let response = self
            .http_client
            .post(format!("{}/v2/checkout/orders", self.api_base_url))
            .bearer_auth(token)
            .header("PayPal-Request-Id", request.idempotency_key.as_str())
            .json(&self.order_body(request))
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;

        let order: OrderResponse = read_json(PROVIDER, response).await?;
        let approve_url = order
            .links
            .iter()
            .find(|link| link.rel == "approve" || link.rel == "payer-action")
            .map(|link| link.href.clone())
            .ok_or_else(|| ProviderError::invalid_response("wallet order has no approval link"))?;

        tracing::debug!(
            intent_id = %request.intent_id,
            external_id = %order.id,
            status = %order.status,
            "wallet order created"
        );

        Ok(ProviderPayment {
            external_id: order.id,
            checkout: CheckoutDetails {
                redirect_url: Some(approve_url),
                ..Default::default()
            },
            synchronous: false,
        })
    }
}

impl CallbackParser for WalletAdapter {
    fn parse_callback(&self, payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
        parse_wallet_callback(payload)
    }
}

fn parse_wallet_callback(payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
    let event_id = required_str(payload, "/id")?;
    let event_type = required_str(payload, "/event_type")?;

    let outcome = match event_type {
        "PAYMENT.CAPTURE.COMPLETED" => CallbackOutcome::Succeeded,
        "PAYMENT.CAPTURE.DENIED" | "PAYMENT.CAPTURE.DECLINED" => CallbackOutcome::Failed,
        "CHECKOUT.ORDER.APPROVED" | "PAYMENT.CAPTURE.PENDING" => CallbackOutcome::Pending,
        _ => return Ok(ProviderCallback::ignored(event_id, event_type)),
    };

    // Capture events reference the order through related_ids.
    let order_id = match required_str(payload, "/resource/supplementary_data/related_ids/order_id") {
        Ok(order_id) => order_id,
        Err(_) => required_str(payload, "/resource/id")?,
    };

    Ok(ProviderCallback {
        event_id: event_id.to_string(),
        event_type: event_type.to_string(),
        external_id: Some(order_id.to_string()),
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_event(event_type: &str) -> serde_json::Value {
        json!({
            "id": "WH-1",
            "event_type": event_type,
            "resource": {
                "id": "CAPTURE-9",
                "supplementary_data": { "related_ids": { "order_id": "ORDER-5" } }
            }
        })
    }

    #[test]
    fn capture_completed_references_order() {
        let callback = parse_wallet_callback(&capture_event("PAYMENT.CAPTURE.COMPLETED")).unwrap();
        assert_eq!(callback.outcome, CallbackOutcome::Succeeded);
        assert_eq!(callback.external_id.as_deref(), Some("ORDER-5"));
    }

    #[test]
    fn denied_and_declined_fail() {
        for event_type in ["PAYMENT.CAPTURE.DENIED", "PAYMENT.CAPTURE.DECLINED"] {
            let callback = parse_wallet_callback(&capture_event(event_type)).unwrap();
            assert_eq!(callback.outcome, CallbackOutcome::Failed);
        }
    }

    #[test]
    fn order_approved_uses_resource_id() {
        let payload = json!({
            "id": "WH-2",
            "event_type": "CHECKOUT.ORDER.APPROVED",
            "resource": { "id": "ORDER-5" }
        });
        let callback = parse_wallet_callback(&payload).unwrap();
        assert_eq!(callback.outcome, CallbackOutcome::Pending);
        assert_eq!(callback.external_id.as_deref(), Some("ORDER-5"));
    }

    #[test]
    fn unknown_event_is_ignored() {
        let payload = json!({ "id": "WH-3", "event_type": "BILLING.PLAN.CREATED" });
        let callback = parse_wallet_callback(&payload).unwrap();
        assert_eq!(callback.outcome, CallbackOutcome::Ignored);
    }

    #[test]
    fn missing_event_type_is_malformed() {
        assert!(parse_wallet_callback(&json!({ "id": "WH-4" })).is_err());
    }
}
