//! Country-specific payment methods.
//!
//! One adapter fronts several gateways, picked by the intent's method:
//!
//! - `midtrans`: Snap transaction, buyer is redirected to the Snap page
//! - `razorpay`: order creation; the storefront opens Razorpay Checkout
//!   with the returned order id
//! - `gopay`, `ovo`, `dana`, `gcash`, `paymaya`: hosted wallet gateway
//! - `pix`: a BR Code returned as payment instructions
//!
//! Methods listed for a country without an integration are refused by
//! [`ProviderAdapter::supports_method`] before any intent is stored.
//!
//! All gateways post callbacks to the same endpoint, signed with the
//! regional webhook secret; the callback body shape tells them apart.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::json;

use super::http_support::{build_client, major_units_string, network_error, read_json};
use crate::config::RegionalProviderConfig;
use crate::domain::payment::{CheckoutDetails, ProviderKind, RegionalIntegration, RegionalMethod};
use crate::domain::webhook::{
    required_str, CallbackOutcome, CallbackParser, ProviderCallback, WebhookError,
};
use crate::ports::{
    ProviderAdapter, ProviderError, ProviderErrorCode, ProviderPayment, ProviderPaymentRequest,
};

const PROVIDER: &str = "regional";

const PIX_CITY: &str = "SAO PAULO";
const PIX_MAX_MERCHANT_LEN: usize = 25;
const PIX_MAX_TXID_LEN: usize = 25;

#[derive(Debug, Deserialize)]
struct SnapTransaction {
    token: String,
    redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayOrder {
    id: String,
}

struct RazorpayCredentials {
    key_id: String,
    key_secret: Secret<String>,
}

/// Regional payment methods adapter.
pub struct RegionalAdapter {
    midtrans_server_key: Option<Secret<String>>,
    midtrans_api_base_url: String,
    razorpay: Option<RazorpayCredentials>,
    razorpay_api_base_url: String,
    id_wallet_gateway_url: String,
    ph_wallet_gateway_url: String,
    pix_key: Option<String>,
    merchant_name: String,
    http_client: reqwest::Client,
}

impl RegionalAdapter {
    pub fn new(config: &RegionalProviderConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let razorpay = match (&config.razorpay_key_id, &config.razorpay_key_secret) {
            (Some(key_id), Some(key_secret)) => Some(RazorpayCredentials {
                key_id: key_id.clone(),
                key_secret: key_secret.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            midtrans_server_key: config.midtrans_server_key.clone(),
            midtrans_api_base_url: config.midtrans_api_base_url().trim_end_matches('/').to_string(),
            razorpay,
            razorpay_api_base_url: config.razorpay_api_base_url.trim_end_matches('/').to_string(),
            id_wallet_gateway_url: config.id_wallet_gateway_url.trim_end_matches('/').to_string(),
            ph_wallet_gateway_url: config.ph_wallet_gateway_url.trim_end_matches('/').to_string(),
            pix_key: config.pix_key.clone(),
            merchant_name: config.merchant_name.clone(),
            http_client: build_client(timeout)?,
        })
    }

    async fn create_snap_transaction(
        &self,
        server_key: &Secret<String>,
        request: &ProviderPaymentRequest,
    ) -> Result<ProviderPayment, ProviderError> {
        let order_id = format!("MIDTRANS-{}", request.intent_id);
        // Snap only takes whole amounts.
        let gross_amount = request
            .currency
            .to_major_units(request.amount_minor_units)
            .round()
            .to_i64()
            .ok_or_else(|| ProviderError::api("amount out of range for midtrans"))?;

        let body = json!({
            "transaction_details": {
                "order_id": order_id,
                "gross_amount": gross_amount,
            },
            "customer_details": { "email": request.customer_email },
        });

        let response = self
            .http_client
            .post(format!("{}/snap/v1/transactions", self.midtrans_api_base_url))
            .basic_auth(server_key.expose_secret(), Some(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;
        let snap: SnapTransaction = read_json(PROVIDER, response).await?;

        Ok(ProviderPayment {
            external_id: order_id,
            checkout: CheckoutDetails {
                redirect_url: Some(snap.redirect_url),
                client_secret: Some(snap.token),
                instructions: None,
            },
            synchronous: false,
        })
    }

    async fn create_razorpay_order(
        &self,
        credentials: &RazorpayCredentials,
        request: &ProviderPaymentRequest,
    ) -> Result<ProviderPayment, ProviderError> {
        let body = json!({
            "amount": request.amount_minor_units,
            "currency": request.currency.as_str(),
            "receipt": request.intent_id.to_string(),
            "notes": {
                "intent_id": request.intent_id.to_string(),
                "customer_email": request.customer_email,
            },
        });

        let response = self
            .http_client
            .post(format!("{}/v1/orders", self.razorpay_api_base_url))
            .basic_auth(&credentials.key_id, Some(credentials.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(PROVIDER, e))?;
        let order: RazorpayOrder = read_json(PROVIDER, response).await?;

        Ok(ProviderPayment {
            checkout: CheckoutDetails {
                instructions: Some(json!({
                    "keyId": credentials.key_id,
                    "orderId": order.id,
                    "amount": request.amount_minor_units,
                    "currency": request.currency.as_str(),
                })),
                ..Default::default()
            },
            external_id: order.id,
            synchronous: false,
        })
    }

    fn hosted_wallet_payment(
        &self,
        method: RegionalMethod,
        request: &ProviderPaymentRequest,
    ) -> ProviderPayment {
        let gateway = match method {
            RegionalMethod::GCash | RegionalMethod::PayMaya => &self.ph_wallet_gateway_url,
            _ => &self.id_wallet_gateway_url,
        };
        let payment_id = format!(
            "{}_{}",
            method.as_str().to_ascii_uppercase(),
            request.intent_id.as_uuid().simple()
        );

        ProviderPayment {
            checkout: CheckoutDetails {
                redirect_url: Some(format!(
                    "{}/{}/pay?id={}",
                    gateway,
                    method.as_str(),
                    payment_id
                )),
                ..Default::default()
            },
            external_id: payment_id,
            synchronous: false,
        }
    }

    fn pix_payment(
        &self,
        pix_key: &str,
        request: &ProviderPaymentRequest,
    ) -> Result<ProviderPayment, ProviderError> {
        if request.currency.as_str() != "BRL" {
            return Err(ProviderError::new(
                ProviderErrorCode::UnsupportedMethod,
                format!("pix only settles BRL, got {}", request.currency),
            ));
        }

        let payment_id = format!("PIX{}", request.intent_id.as_uuid().simple());
        let payment_id: String = payment_id.chars().take(PIX_MAX_TXID_LEN).collect();
        let amount = major_units_string(&request.currency, request.amount_minor_units);
        let code = pix_code(pix_key, &self.merchant_name, &amount, &payment_id);

        Ok(ProviderPayment {
            checkout: CheckoutDetails {
                instructions: Some(json!({
                    "pixCode": code,
                    "paymentId": payment_id,
                    "amount": amount,
                    "currency": "BRL",
                })),
                ..Default::default()
            },
            external_id: payment_id,
            synchronous: false,
        })
    }
}

#[async_trait]
impl ProviderAdapter for RegionalAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Regional
    }

    async fn create(
        &self,
        request: &ProviderPaymentRequest,
    ) -> Result<ProviderPayment, ProviderError> {
        let method = request.method.ok_or_else(|| {
            ProviderError::new(
                ProviderErrorCode::UnsupportedMethod,
                "regional payments need a method",
            )
        })?;

        let payment = match method.integration() {
            RegionalIntegration::MidtransSnap => match &self.midtrans_server_key {
                Some(key) => self.create_snap_transaction(key, request).await?,
                None => return Err(ProviderError::unsupported_method(method)),
            },
            RegionalIntegration::RazorpayOrder => match &self.razorpay {
                Some(credentials) => self.create_razorpay_order(credentials, request).await?,
                None => return Err(ProviderError::unsupported_method(method)),
            },
            RegionalIntegration::HostedWallet => self.hosted_wallet_payment(method, request),
            RegionalIntegration::PixCode => match &self.pix_key {
                Some(key) => self.pix_payment(key, request)?,
                None => return Err(ProviderError::unsupported_method(method)),
            },
            RegionalIntegration::Unavailable => {
                return Err(ProviderError::unsupported_method(method))
            }
        };

        tracing::debug!(
            intent_id = %request.intent_id,
            method = %method,
            external_id = %payment.external_id,
            "regional payment created"
        );
        Ok(payment)
    }

    fn supports_method(&self, method: Option<RegionalMethod>) -> bool {
        let Some(method) = method else {
            return false;
        };
        match method.integration() {
            RegionalIntegration::MidtransSnap => self.midtrans_server_key.is_some(),
            RegionalIntegration::RazorpayOrder => self.razorpay.is_some(),
            RegionalIntegration::HostedWallet => true,
            RegionalIntegration::PixCode => self.pix_key.is_some(),
            RegionalIntegration::Unavailable => false,
        }
    }
}

impl CallbackParser for RegionalAdapter {
    fn parse_callback(&self, payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
        parse_regional_callback(payload)
    }
}

fn parse_regional_callback(payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
    if payload.get("transaction_status").is_some() {
        parse_midtrans(payload)
    } else if payload.get("event").is_some() && payload.get("payload").is_some() {
        parse_razorpay(payload)
    } else {
        parse_gateway(payload)
    }
}

fn parse_midtrans(payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
    let status = required_str(payload, "/transaction_status")?;
    let transaction_id = required_str(payload, "/transaction_id")?;
    let event_id = format!("{}:{}", transaction_id, status);

    let outcome = match status {
        "capture" if payload.get("fraud_status").and_then(|v| v.as_str()) == Some("challenge") => {
            CallbackOutcome::Pending
        }
        "capture" | "settlement" => CallbackOutcome::Succeeded,
        "pending" => CallbackOutcome::Pending,
        "deny" | "cancel" | "expire" | "failure" => CallbackOutcome::Failed,
        _ => return Ok(ProviderCallback::ignored(event_id, status)),
    };

    Ok(ProviderCallback {
        event_id,
        event_type: format!("midtrans.{}", status),
        external_id: Some(required_str(payload, "/order_id")?.to_string()),
        outcome,
    })
}

fn parse_razorpay(payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
    let event = required_str(payload, "/event")?;

    let outcome = match event {
        "payment.captured" | "order.paid" => CallbackOutcome::Succeeded,
        "payment.failed" => CallbackOutcome::Failed,
        "payment.authorized" => CallbackOutcome::Pending,
        _ => {
            let created_at = payload.get("created_at").map(|v| v.to_string()).unwrap_or_default();
            return Ok(ProviderCallback::ignored(format!("{}:{}", event, created_at), event));
        }
    };

    let payment_id = required_str(payload, "/payload/payment/entity/id")?;
    Ok(ProviderCallback {
        event_id: format!("{}:{}", payment_id, event),
        event_type: format!("razorpay.{}", event),
        external_id: Some(required_str(payload, "/payload/payment/entity/order_id")?.to_string()),
        outcome,
    })
}

fn parse_gateway(payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
    let event_id = required_str(payload, "/event_id")?;
    let status = required_str(payload, "/status")?;

    let outcome = match status {
        "paid" | "succeeded" | "completed" => CallbackOutcome::Succeeded,
        "failed" | "expired" | "cancelled" | "canceled" => CallbackOutcome::Failed,
        "pending" => CallbackOutcome::Pending,
        _ => return Ok(ProviderCallback::ignored(event_id, status)),
    };

    Ok(ProviderCallback {
        event_id: event_id.to_string(),
        event_type: format!("gateway.{}", status),
        external_id: Some(required_str(payload, "/payment_id")?.to_string()),
        outcome,
    })
}

/// EMV merchant-presented BR Code for a static-key PIX payment.
fn pix_code(pix_key: &str, merchant_name: &str, amount: &str, payment_id: &str) -> String {
    let merchant: String = merchant_name
        .chars()
        .filter(|c| c.is_ascii())
        .take(PIX_MAX_MERCHANT_LEN)
        .collect();
    let account = format!("{}{}", tlv("00", "BR.GOV.BCB.PIX"), tlv("01", pix_key));

    let mut code = String::new();
    code.push_str(&tlv("00", "01"));
    code.push_str(&tlv("26", &account));
    code.push_str(&tlv("52", "0000"));
    code.push_str(&tlv("53", "986"));
    code.push_str(&tlv("54", amount));
    code.push_str(&tlv("58", "BR"));
    code.push_str(&tlv("59", &merchant));
    code.push_str(&tlv("60", PIX_CITY));
    code.push_str(&tlv("62", &tlv("05", payment_id)));
    code.push_str("6304");

    let crc = crc16_ccitt(code.as_bytes());
    code.push_str(&format!("{:04X}", crc));
    code
}

fn tlv(id: &str, value: &str) -> String {
    format!("{}{:02}{}", id, value.len(), value)
}

/// CRC-16/CCITT-FALSE, as required for the BR Code checksum field.
fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}
