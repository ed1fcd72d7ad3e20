//! Provider callback signature verification.
//!
//! Every provider signs callbacks with HMAC-SHA256 over a shared secret.
//! The card processor signs `"<unix>.<body>"` and sends
//! `t=<unix>,v1=<hex>`; the others send the hex HMAC of the raw body.
//! Timestamped signatures are checked against a 5 minute window to prevent
//! replay attacks.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::event::{CallbackParser, WebhookEvent};
use super::recent_events::RecentEventCache;
use crate::domain::foundation::Timestamp;
use crate::domain::payment::ProviderKind;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// How a provider signs its callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureScheme {
    /// `t=<unix>,v1=<hex>` over `"<unix>.<body>"`.
    Timestamped,
    /// Hex HMAC over the raw body.
    Body,
}

impl SignatureScheme {
    pub fn for_provider(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::Card => SignatureScheme::Timestamped,
            _ => SignatureScheme::Body,
        }
    }
}

/// HTTP header carrying the callback signature for a provider.
pub fn signature_header_name(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Card => "Stripe-Signature",
        ProviderKind::Wallet => "PayPal-Transmission-Sig",
        ProviderKind::Crypto => "X-CoinGate-Signature",
        ProviderKind::Regional => "X-Callback-Signature",
        ProviderKind::BankTransfer => "X-Webhook-Signature",
    }
}

/// Parsed components of a timestamped signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signature (HMAC-SHA256).
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a timestamped signature header.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,...]`
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part.trim().split_once('=').ok_or_else(|| {
                WebhookError::MalformedPayload("invalid signature header format".to_string())
            })?;

            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::MalformedPayload("invalid signature timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::MalformedPayload("invalid v1 signature hex".to_string())
                    })?);
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            WebhookError::MalformedPayload("missing signature timestamp".to_string())
        })?;
        let v1_signature = v1_signature
            .ok_or_else(|| WebhookError::MalformedPayload("missing v1 signature".to_string()))?;

        Ok(SignatureHeader {
            timestamp,
            v1_signature,
        })
    }
}

struct ProviderSecret {
    secret: Secret<String>,
    scheme: SignatureScheme,
}

/// Verifies callback signatures and keeps a short memory of handled events.
pub struct WebhookVerifier {
    secrets: HashMap<ProviderKind, ProviderSecret>,
    recent: RecentEventCache,
}

impl WebhookVerifier {
    pub fn new(recent: RecentEventCache) -> Self {
        Self {
            secrets: HashMap::new(),
            recent,
        }
    }

    /// Registers the signing secret for a provider.
    pub fn with_secret(mut self, provider: ProviderKind, secret: Secret<String>) -> Self {
        self.secrets.insert(
            provider,
            ProviderSecret {
                secret,
                scheme: SignatureScheme::for_provider(provider),
            },
        );
        self
    }

    /// Verifies the signature, then parses the body into a [`WebhookEvent`].
    ///
    /// # Errors
    ///
    /// - `UnsupportedProvider` - no secret registered for the provider
    /// - `MissingSignature` / `InvalidSignature` - signature verification failed
    /// - `TimestampOutOfRange` / `InvalidTimestamp` - signed time outside the window
    /// - `MalformedPayload` - header or JSON body could not be parsed
    pub fn verify<P: CallbackParser + ?Sized>(
        &self,
        provider: ProviderKind,
        parser: &P,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookEvent, WebhookError> {
        self.verify_at(
            provider,
            parser,
            payload,
            signature_header,
            chrono::Utc::now().timestamp(),
        )
    }

    fn verify_at<P: CallbackParser + ?Sized>(
        &self,
        provider: ProviderKind,
        parser: &P,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> Result<WebhookEvent, WebhookError> {
        let entry = self
            .secrets
            .get(&provider)
            .ok_or_else(|| WebhookError::UnsupportedProvider(provider.to_string()))?;

        let signature_header = signature_header.trim();
        if signature_header.is_empty() {
            return Err(WebhookError::MissingSignature);
        }

        let secret = entry.secret.expose_secret().as_bytes();
        match entry.scheme {
            SignatureScheme::Timestamped => {
                let header = SignatureHeader::parse(signature_header)?;
                validate_timestamp(header.timestamp, now)?;
                let expected = compute_mac(secret, &timestamped_payload(header.timestamp, payload))?;
                if !constant_time_compare(&expected, &header.v1_signature) {
                    return Err(WebhookError::InvalidSignature);
                }
            }
            SignatureScheme::Body => {
                let provided =
                    hex::decode(signature_header).map_err(|_| WebhookError::InvalidSignature)?;
                let expected = compute_mac(secret, payload)?;
                if !constant_time_compare(&expected, &provided) {
                    return Err(WebhookError::InvalidSignature);
                }
            }
        }

        let value: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::MalformedPayload(e.to_string()))?;
        let callback = parser.parse_callback(&value)?;

        Ok(WebhookEvent::from_callback(
            provider,
            callback,
            value,
            Timestamp::now(),
        ))
    }

    /// True if the event was handled moments ago.
    pub fn seen_recently(&self, provider: ProviderKind, event_id: &str) -> bool {
        self.recent.contains(provider, event_id)
    }

    /// Records a handled event for cheap duplicate rejection.
    pub fn remember(&self, provider: ProviderKind, event_id: &str) {
        self.recent.remember(provider, event_id);
    }

    pub fn has_secret(&self, provider: ProviderKind) -> bool {
        self.secrets.contains_key(&provider)
    }
}

/// Validates that the timestamp is within acceptable bounds.
fn validate_timestamp(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    let age = now - timestamp;

    if age > MAX_EVENT_AGE_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }

    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::InvalidTimestamp);
    }

    Ok(())
}

fn timestamped_payload(timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut signed = format!("{}.", timestamp).into_bytes();
    signed.extend_from_slice(payload);
    signed
}

fn compute_mac(secret: &[u8], message: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Builds the header value a provider would send for `payload`.
///
/// Used by sandbox tooling and tests to produce signed callbacks.
pub fn sign_payload(
    provider: ProviderKind,
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, WebhookError> {
    match SignatureScheme::for_provider(provider) {
        SignatureScheme::Timestamped => {
            let mac = compute_mac(secret.as_bytes(), &timestamped_payload(timestamp, payload))?;
            Ok(format!("t={},v1={}", timestamp, hex::encode(mac)))
        }
        SignatureScheme::Body => Ok(hex::encode(compute_mac(secret.as_bytes(), payload)?)),
    }
}
