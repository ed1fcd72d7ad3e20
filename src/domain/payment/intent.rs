//! PaymentIntent aggregate.
//!
//! An intent is created once per idempotency key, persisted before the
//! provider is called, and afterwards only ever moves forward through
//! [`IntentStatus`]. Intents are never deleted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::method_catalog::{self, CountryCode};
use super::provider::{ProviderKind, RegionalMethod};
use super::status::IntentStatus;
use crate::domain::foundation::{
    Currency, IdempotencyKey, IntentId, StateMachine, Timestamp, TransitionError, ValidationError,
};

pub const MIN_AMOUNT_MINOR_UNITS: i64 = 1;
pub const MAX_AMOUNT_MINOR_UNITS: i64 = 99_999_999;

pub const MAX_METADATA_ENTRIES: usize = 50;
pub const MAX_METADATA_KEY_LEN: usize = 40;
pub const MAX_METADATA_VALUE_LEN: usize = 500;

const MAX_EMAIL_LEN: usize = 254;

/// What the buyer needs to finish paying, as returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Free-form payment instructions (bank details, PIX code).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<serde_json::Value>,
}

impl CheckoutDetails {
    pub fn is_empty(&self) -> bool {
        self.redirect_url.is_none() && self.client_secret.is_none() && self.instructions.is_none()
    }
}

/// A validated checkout request, ready to become an intent.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentDraft {
    pub idempotency_key: IdempotencyKey,
    pub provider: ProviderKind,
    pub method: Option<RegionalMethod>,
    pub country: Option<CountryCode>,
    pub amount_minor_units: i64,
    pub currency: Currency,
    pub customer_email: String,
    pub metadata: BTreeMap<String, String>,
}

impl IntentDraft {
    /// Checks the field-level rules that do not depend on configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_AMOUNT_MINOR_UNITS..=MAX_AMOUNT_MINOR_UNITS).contains(&self.amount_minor_units) {
            return Err(ValidationError::out_of_range(
                "amount",
                MIN_AMOUNT_MINOR_UNITS,
                MAX_AMOUNT_MINOR_UNITS,
                self.amount_minor_units,
            ));
        }

        validate_email(&self.customer_email)?;
        validate_metadata(&self.metadata)?;

        match (self.provider, self.method) {
            (ProviderKind::Regional, None) => {
                return Err(ValidationError::empty_field("method"));
            }
            (ProviderKind::Regional, Some(method)) => {
                if let Some(country) = &self.country {
                    if !method_catalog::is_offered_in(method, country) {
                        return Err(ValidationError::invalid_format(
                            "method",
                            format!("'{}' is not offered in {}", method, country),
                        ));
                    }
                }
            }
            (_, Some(_)) => {
                return Err(ValidationError::invalid_format(
                    "method",
                    "only regional payments take a method",
                ));
            }
            (_, None) => {}
        }

        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::empty_field("customerEmail"));
    }
    let invalid = |reason: &str| ValidationError::invalid_format("customerEmail", reason);

    if email.len() > MAX_EMAIL_LEN {
        return Err(invalid("too long"));
    }
    let (local, domain) = email.split_once('@').ok_or_else(|| invalid("missing '@'"))?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid("malformed address"));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("malformed domain"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("contains whitespace"));
    }
    Ok(())
}

fn validate_metadata(metadata: &BTreeMap<String, String>) -> Result<(), ValidationError> {
    if metadata.len() > MAX_METADATA_ENTRIES {
        return Err(ValidationError::out_of_range(
            "metadata",
            0,
            MAX_METADATA_ENTRIES as i64,
            metadata.len() as i64,
        ));
    }
    for (key, value) in metadata {
        if key.is_empty() || key.chars().count() > MAX_METADATA_KEY_LEN {
            return Err(ValidationError::invalid_format(
                "metadata",
                format!("key '{}' must be 1-{} characters", key, MAX_METADATA_KEY_LEN),
            ));
        }
        if value.chars().count() > MAX_METADATA_VALUE_LEN {
            return Err(ValidationError::invalid_format(
                "metadata",
                format!(
                    "value for '{}' exceeds {} characters",
                    key, MAX_METADATA_VALUE_LEN
                ),
            ));
        }
    }
    Ok(())
}

/// A single checkout attempt tracked across its provider round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: IntentId,
    pub idempotency_key: IdempotencyKey,
    pub provider: ProviderKind,
    pub method: Option<RegionalMethod>,
    pub country: Option<String>,
    pub amount_minor_units: i64,
    pub currency: Currency,
    pub status: IntentStatus,
    pub customer_email: String,
    pub metadata: BTreeMap<String, String>,
    pub external_id: Option<String>,
    pub checkout: CheckoutDetails,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PaymentIntent {
    /// Creates a fresh intent in `created` from a validated draft.
    pub fn create(draft: IntentDraft, now: Timestamp) -> Self {
        Self {
            id: IntentId::new(),
            idempotency_key: draft.idempotency_key,
            provider: draft.provider,
            method: draft.method,
            country: draft.country.map(|c| c.as_str().to_string()),
            amount_minor_units: draft.amount_minor_units,
            currency: draft.currency,
            status: IntentStatus::Created,
            customer_email: draft.customer_email.trim().to_string(),
            metadata: draft.metadata,
            external_id: None,
            checkout: CheckoutDetails::default(),
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves to `target` if the state machine allows it.
    pub fn transition_to(
        &mut self,
        target: IntentStatus,
        now: Timestamp,
    ) -> Result<(), TransitionError> {
        self.status = self.status.transition_to(target)?;
        self.updated_at = now;
        Ok(())
    }

    /// Records a successful provider create call.
    pub fn record_provider_payment(
        &mut self,
        external_id: String,
        checkout: CheckoutDetails,
        synchronous: bool,
        now: Timestamp,
    ) -> Result<(), TransitionError> {
        let target = if synchronous {
            IntentStatus::Succeeded
        } else {
            IntentStatus::Pending
        };
        self.transition_to(target, now)?;
        self.external_id = Some(external_id);
        self.checkout = checkout;
        Ok(())
    }

    /// Marks the intent failed with the provider's reason.
    pub fn fail(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), TransitionError> {
        self.transition_to(IntentStatus::Failed, now)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    /// True when the intent sat in `created` for at least `ttl_secs`.
    pub fn is_logically_expired(&self, ttl_secs: u64, now: Timestamp) -> bool {
        self.status == IntentStatus::Created
            && now.duration_since(&self.created_at).num_seconds()
                >= i64::try_from(ttl_secs).unwrap_or(i64::MAX)
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == IntentStatus::Succeeded
    }
}
