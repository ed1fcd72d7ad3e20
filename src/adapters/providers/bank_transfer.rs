//! Manual bank transfer.
//!
//! No processor is involved: the buyer receives the receiving account and a
//! unique transfer reference. Matching incoming transfers to intents happens
//! outside this service, so intents stay `pending` and callbacks are refused.

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use super::http_support::major_units_string;
use crate::config::BankTransferConfig;
use crate::domain::foundation::Timestamp;
use crate::domain::payment::{CheckoutDetails, ProviderKind};
use crate::domain::webhook::{CallbackParser, ProviderCallback, WebhookError};
use crate::ports::{ProviderAdapter, ProviderError, ProviderPayment, ProviderPaymentRequest};

const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const REFERENCE_SUFFIX_LEN: usize = 5;

/// Bank transfer adapter.
pub struct BankTransferAdapter {
    config: BankTransferConfig,
}

impl BankTransferAdapter {
    pub fn new(config: BankTransferConfig) -> Self {
        Self { config }
    }
}

/// `BT<unix millis><5 uppercase alphanumerics>`
pub fn transfer_reference(now: Timestamp) -> String {
    let random = Uuid::new_v4();
    let suffix: String = random
        .as_bytes()
        .iter()
        .take(REFERENCE_SUFFIX_LEN)
        .map(|b| REFERENCE_ALPHABET[*b as usize % REFERENCE_ALPHABET.len()] as char)
        .collect();
    format!("BT{}{}", now.as_unix_millis(), suffix)
}

#[async_trait]
impl ProviderAdapter for BankTransferAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::BankTransfer
    }

    async fn create(
        &self,
        request: &ProviderPaymentRequest,
    ) -> Result<ProviderPayment, ProviderError> {
        let account = self
            .config
            .account_for(request.country.as_deref())
            .ok_or_else(|| ProviderError::api("no receiving bank account configured"))?;
        let reference = transfer_reference(Timestamp::now());

        let instructions = json!({
            "bankName": account.bank_name,
            "accountNumber": account.account_number,
            "routingNumber": account.routing_number,
            "sortCode": account.sort_code,
            "swiftCode": account.swift_code,
            "beneficiary": self.config.beneficiary,
            "amount": major_units_string(&request.currency, request.amount_minor_units),
            "currency": request.currency.as_str(),
            "reference": reference,
        });

        tracing::info!(
            intent_id = %request.intent_id,
            reference = %reference,
            "bank transfer instructions issued"
        );

        Ok(ProviderPayment {
            external_id: reference,
            checkout: CheckoutDetails {
                instructions: Some(instructions),
                ..Default::default()
            },
            synchronous: false,
        })
    }

    fn accepts_callbacks(&self) -> bool {
        false
    }
}

impl CallbackParser for BankTransferAdapter {
    fn parse_callback(&self, _payload: &serde_json::Value) -> Result<ProviderCallback, WebhookError> {
        Err(WebhookError::CallbacksNotAccepted(
            ProviderKind::BankTransfer.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Currency, IdempotencyKey, IntentId};
    use std::collections::BTreeMap;

    fn request(country: Option<&str>) -> ProviderPaymentRequest {
        ProviderPaymentRequest {
            intent_id: IntentId::new(),
            idempotency_key: IdempotencyKey::new("k").unwrap(),
            amount_minor_units: 4700,
            currency: Currency::usd(),
            customer_email: "buyer@example.com".to_string(),
            method: None,
            country: country.map(str::to_string),
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn reference_has_expected_shape() {
        let now = Timestamp::now();
        let reference = transfer_reference(now);
        let millis = now.as_unix_millis().to_string();

        assert!(reference.starts_with(&format!("BT{}", millis)));
        let suffix = &reference[2 + millis.len()..];
        assert_eq!(suffix.len(), 5);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn create_returns_pending_with_instructions() {
        let adapter = BankTransferAdapter::new(BankTransferConfig::default());

        let payment = adapter.create(&request(Some("gb"))).await.unwrap();

        assert!(!payment.synchronous);
        let instructions = payment.checkout.instructions.unwrap();
        assert_eq!(instructions["reference"], payment.external_id.as_str());
        assert_eq!(instructions["amount"], "47.00");
        assert!(instructions["sortCode"].is_string());
    }

    #[tokio::test]
    async fn unknown_country_falls_back_to_us_account() {
        let adapter = BankTransferAdapter::new(BankTransferConfig::default());

        let payment = adapter.create(&request(Some("ZZ"))).await.unwrap();

        let instructions = payment.checkout.instructions.unwrap();
        assert!(instructions["routingNumber"].is_string());
    }

    #[test]
    fn callbacks_are_refused() {
        let adapter = BankTransferAdapter::new(BankTransferConfig::default());
        assert!(!adapter.accepts_callbacks());
        assert!(matches!(
            adapter.parse_callback(&json!({})),
            Err(WebhookError::CallbacksNotAccepted(_))
        ));
    }
}
