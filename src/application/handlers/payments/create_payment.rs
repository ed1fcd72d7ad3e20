//! CreatePaymentHandler - Command handler for checkout submissions.
//!
//! The idempotency key decides everything: a key seen before returns the
//! stored intent without touching the provider. A new key is inserted
//! atomically before the provider is called, so of several concurrent
//! submissions exactly one reaches the provider.
//!
//! The provider call and the write of its outcome run on a detached task.
//! A client that disconnects mid-request cannot leave an intent stuck in
//! `created` with the charge already made.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::expire_if_stale;
use crate::application::{IntentLocks, ProviderRegistry};
use crate::domain::foundation::{Currency, IdempotencyKey, Timestamp, ValidationError};
use crate::domain::payment::{
    CountryCode, IntentDraft, IntentStatus, PaymentError, PaymentIntent, ProviderKind,
    RegionalMethod,
};
use crate::ports::{
    FulfillmentHook, InsertResult, IntentStore, ProviderAdapter, ProviderPaymentRequest,
};

/// Command to create (or replay) a payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentCommand {
    pub idempotency_key: String,
    pub provider: String,
    pub method: Option<String>,
    pub country: Option<String>,
    pub amount_minor_units: i64,
    pub currency: String,
    pub customer_email: String,
    pub metadata: BTreeMap<String, String>,
}

/// Result of a create call.
#[derive(Debug, Clone)]
pub struct CreatePaymentResult {
    pub intent: PaymentIntent,
    /// True when the key was already known and nothing new happened.
    pub replayed: bool,
}

/// Handler for checkout submissions.
pub struct CreatePaymentHandler {
    store: Arc<dyn IntentStore>,
    registry: Arc<ProviderRegistry>,
    locks: Arc<IntentLocks>,
    fulfillment: Arc<dyn FulfillmentHook>,
    intent_ttl_secs: u64,
}

impl CreatePaymentHandler {
    pub fn new(
        store: Arc<dyn IntentStore>,
        registry: Arc<ProviderRegistry>,
        locks: Arc<IntentLocks>,
        fulfillment: Arc<dyn FulfillmentHook>,
        intent_ttl_secs: u64,
    ) -> Self {
        Self {
            store,
            registry,
            locks,
            fulfillment,
            intent_ttl_secs,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentCommand,
    ) -> Result<CreatePaymentResult, PaymentError> {
        // 1. Replay a known key before validating anything else
        let key = IdempotencyKey::new(cmd.idempotency_key.clone())?;
        if let Some(existing) = self.store.get_by_key(&key).await? {
            tracing::debug!(intent_id = %existing.id, "idempotent replay");
            let existing =
                expire_if_stale(self.store.as_ref(), &self.locks, existing, self.intent_ttl_secs)
                    .await?;
            return Ok(replayed(existing));
        }

        // 2. Resolve the adapter and validate the request
        let kind: ProviderKind = cmd
            .provider
            .parse()
            .map_err(|_| PaymentError::UnsupportedProvider(cmd.provider.clone()))?;
        let adapter = self
            .registry
            .get(kind)
            .ok_or_else(|| PaymentError::UnsupportedProvider(kind.to_string()))?;

        let draft = build_draft(key, kind, &cmd)?;
        draft.validate()?;
        if !adapter.supports_method(draft.method) {
            let name = draft
                .method
                .map(|m| m.to_string())
                .unwrap_or_else(|| kind.to_string());
            return Err(PaymentError::UnsupportedMethod(name));
        }

        // 3. Claim the key
        let intent = PaymentIntent::create(draft, Timestamp::now());
        match self.store.insert_new(&intent).await? {
            InsertResult::Inserted => {}
            InsertResult::AlreadyExists(existing) => {
                tracing::debug!(intent_id = %existing.id, "lost idempotency race");
                return Ok(replayed(existing));
            }
        }
        tracing::info!(
            intent_id = %intent.id,
            provider = %kind,
            amount_minor_units = intent.amount_minor_units,
            currency = %intent.currency,
            "payment intent created"
        );

        // 4. Call the provider detached from this request
        let task = tokio::spawn(call_provider(
            adapter,
            self.store.clone(),
            self.locks.clone(),
            self.fulfillment.clone(),
            intent,
        ));
        let intent = task
            .await
            .map_err(|e| PaymentError::Internal(format!("provider task failed: {}", e)))??;

        Ok(CreatePaymentResult {
            intent,
            replayed: false,
        })
    }
}

fn replayed(intent: PaymentIntent) -> CreatePaymentResult {
    CreatePaymentResult {
        intent,
        replayed: true,
    }
}

fn build_draft(
    key: IdempotencyKey,
    provider: ProviderKind,
    cmd: &CreatePaymentCommand,
) -> Result<IntentDraft, PaymentError> {
    let method = cmd
        .method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            m.parse::<RegionalMethod>()
                .map_err(|reason| ValidationError::invalid_format("method", reason))
        })
        .transpose()?;
    let country = cmd
        .country
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(CountryCode::new)
        .transpose()?;

    Ok(IntentDraft {
        idempotency_key: key,
        provider,
        method,
        country,
        amount_minor_units: cmd.amount_minor_units,
        currency: Currency::new(&cmd.currency)?,
        customer_email: cmd.customer_email.clone(),
        metadata: cmd.metadata.clone(),
    })
}

/// Calls the provider and records the outcome under the intent's lock.
async fn call_provider(
    adapter: Arc<dyn ProviderAdapter>,
    store: Arc<dyn IntentStore>,
    locks: Arc<IntentLocks>,
    fulfillment: Arc<dyn FulfillmentHook>,
    intent: PaymentIntent,
) -> Result<PaymentIntent, PaymentError> {
    let outcome = adapter.create(&ProviderPaymentRequest::from(&intent)).await;

    let _guard = locks.lock(intent.id).await;
    let mut current = store
        .get_by_id(&intent.id)
        .await?
        .ok_or(PaymentError::NotFound(intent.id))?;

    if current.status != IntentStatus::Created {
        // Expired by a poll while the provider was answering.
        tracing::warn!(
            intent_id = %current.id,
            status = %current.status,
            "intent moved on before the provider answered"
        );
        return match outcome {
            Ok(_) => Ok(current),
            Err(e) => Err(PaymentError::Provider {
                intent_id: current.id,
                message: e.message,
            }),
        };
    }

    let now = Timestamp::now();
    match outcome {
        Ok(payment) => {
            current.record_provider_payment(
                payment.external_id,
                payment.checkout,
                payment.synchronous,
                now,
            )?;
            store.put(&current).await?;
            tracing::info!(
                intent_id = %current.id,
                provider = %current.provider,
                status = %current.status,
                "provider accepted payment"
            );

            if current.is_succeeded() {
                fulfill(fulfillment.as_ref(), &current).await;
            }
            Ok(current)
        }
        Err(e) => {
            tracing::warn!(
                intent_id = %current.id,
                provider = %current.provider,
                code = %e.code,
                error = %e.message,
                "provider rejected payment"
            );
            current.fail(e.message.clone(), now)?;
            store.put(&current).await?;
            Err(PaymentError::Provider {
                intent_id: current.id,
                message: e.message,
            })
        }
    }
}

/// Runs fulfillment once; failures are logged and never undo the payment.
pub(crate) async fn fulfill(fulfillment: &dyn FulfillmentHook, intent: &PaymentIntent) {
    if let Err(e) = fulfillment.on_payment_succeeded(intent).await {
        tracing::error!(intent_id = %intent.id, error = %e, "fulfillment failed");
    }
}
