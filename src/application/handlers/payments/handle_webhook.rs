//! HandleWebhookHandler - Command handler for provider callbacks.
//!
//! A callback is applied at most once: recently seen event ids are rejected
//! from memory, older ones from the processed-webhook store. Status changes
//! only ever move an intent forward, and fulfillment runs only on the
//! transition into `succeeded`.

use std::sync::Arc;

use super::create_payment::fulfill;
use crate::application::{IntentLocks, ProviderRegistry};
use crate::domain::foundation::{DomainError, IntentId, StateMachine, Timestamp};
use crate::domain::payment::{IntentStatus, ProviderKind};
use crate::domain::webhook::{WebhookError, WebhookEvent, WebhookVerifier};
use crate::ports::{
    FulfillmentHook, IntentStore, SaveResult, WebhookEventRecord, WebhookEventRepository,
};

/// Command to handle a provider callback.
#[derive(Debug, Clone)]
pub struct HandleWebhookCommand {
    /// Provider name from the URL path.
    pub provider: String,
    /// Raw request body, exactly as signed.
    pub payload: Vec<u8>,
    /// Provider signature header, if present.
    pub signature: Option<String>,
}

/// Result of callback processing.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleWebhookResult {
    /// Callback referenced an intent; `changed` is false when it was already
    /// in (or past) the reported state.
    Processed {
        intent_id: IntentId,
        status: IntentStatus,
        changed: bool,
    },
    /// Event was handled before.
    Duplicate,
    /// Event type has no effect on intents.
    Ignored,
}

/// Handler for provider callbacks.
pub struct HandleWebhookHandler {
    store: Arc<dyn IntentStore>,
    events: Arc<dyn WebhookEventRepository>,
    registry: Arc<ProviderRegistry>,
    verifier: Arc<WebhookVerifier>,
    locks: Arc<IntentLocks>,
    fulfillment: Arc<dyn FulfillmentHook>,
}

impl HandleWebhookHandler {
    pub fn new(
        store: Arc<dyn IntentStore>,
        events: Arc<dyn WebhookEventRepository>,
        registry: Arc<ProviderRegistry>,
        verifier: Arc<WebhookVerifier>,
        locks: Arc<IntentLocks>,
        fulfillment: Arc<dyn FulfillmentHook>,
    ) -> Self {
        Self {
            store,
            events,
            registry,
            verifier,
            locks,
            fulfillment,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleWebhookCommand,
    ) -> Result<HandleWebhookResult, WebhookError> {
        // 1. Resolve the provider
        let kind: ProviderKind = cmd
            .provider
            .parse()
            .map_err(|_| WebhookError::UnsupportedProvider(cmd.provider.clone()))?;
        let adapter = self
            .registry
            .get(kind)
            .ok_or_else(|| WebhookError::UnsupportedProvider(kind.to_string()))?;
        if !adapter.accepts_callbacks() {
            return Err(WebhookError::CallbacksNotAccepted(kind.to_string()));
        }

        // 2. Verify signature and parse
        let signature = cmd.signature.as_deref().ok_or(WebhookError::MissingSignature)?;
        let event = self
            .verifier
            .verify(kind, adapter.as_ref(), &cmd.payload, signature)
            .map_err(|e| {
                tracing::warn!(provider = %kind, error = %e, "webhook rejected");
                e
            })?;

        // 3. Deduplicate
        if self.is_duplicate(&event).await? {
            tracing::debug!(
                provider = %kind,
                event_id = %event.provider_event_id,
                "duplicate webhook"
            );
            return Ok(HandleWebhookResult::Duplicate);
        }

        // 4. Events without a target status are only acknowledged
        let (target, external_id) = match (event.outcome.target_status(), &event.external_id) {
            (Some(target), Some(external_id)) => (target, external_id.clone()),
            _ => return self.acknowledge_ignored(event).await,
        };

        // 5. Apply to the referenced intent
        let found = self
            .store
            .get_by_external_id(kind, &external_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(
                    provider = %kind,
                    external_id = %external_id,
                    event_id = %event.provider_event_id,
                    "webhook for unknown payment, asking provider to retry"
                );
                WebhookError::IntentNotFound(external_id.clone())
            })?;

        let result = {
            let _guard = self.locks.lock(found.id).await;
            self.apply(found.id, target, &event).await?
        };

        // 6. Record as processed
        let record = WebhookEventRecord::success(
            kind,
            event.provider_event_id.clone(),
            event.event_type.clone(),
            event.payload.clone(),
        );
        if self.save(record).await? == SaveResult::AlreadyExists {
            tracing::debug!(event_id = %event.provider_event_id, "webhook recorded concurrently");
        }
        self.verifier.remember(kind, &event.provider_event_id);

        Ok(result)
    }

    async fn is_duplicate(&self, event: &WebhookEvent) -> Result<bool, WebhookError> {
        if self
            .verifier
            .seen_recently(event.provider, &event.provider_event_id)
        {
            return Ok(true);
        }
        let existing = self
            .events
            .find_by_event_id(event.provider, &event.provider_event_id)
            .await
            .map_err(storage_error)?;
        Ok(existing.is_some())
    }

    async fn acknowledge_ignored(
        &self,
        event: WebhookEvent,
    ) -> Result<HandleWebhookResult, WebhookError> {
        tracing::info!(
            provider = %event.provider,
            event_id = %event.provider_event_id,
            event_type = %event.event_type,
            "webhook event ignored"
        );
        let record = WebhookEventRecord::ignored(
            event.provider,
            event.provider_event_id.clone(),
            event.event_type.clone(),
            "event type does not affect payment intents",
            event.payload,
        );
        let saved = self.save(record).await?;
        self.verifier
            .remember(event.provider, &event.provider_event_id);

        Ok(match saved {
            SaveResult::Inserted => HandleWebhookResult::Ignored,
            SaveResult::AlreadyExists => HandleWebhookResult::Duplicate,
        })
    }

    /// Moves the intent toward `target`. Caller holds the intent's lock.
    async fn apply(
        &self,
        id: IntentId,
        target: IntentStatus,
        event: &WebhookEvent,
    ) -> Result<HandleWebhookResult, WebhookError> {
        let mut intent = self
            .store
            .get_by_id(&id)
            .await?
            .ok_or_else(|| WebhookError::IntentNotFound(id.to_string()))?;

        if intent.status == target || !intent.status.can_transition_to(&target) {
            if intent.status != target {
                tracing::warn!(
                    intent_id = %intent.id,
                    status = %intent.status,
                    reported = %target,
                    event_id = %event.provider_event_id,
                    "webhook would move intent backwards, ignoring"
                );
            }
            return Ok(HandleWebhookResult::Processed {
                intent_id: intent.id,
                status: intent.status,
                changed: false,
            });
        }

        let now = Timestamp::now();
        match target {
            IntentStatus::Failed => intent
                .fail(format!("provider reported {}", event.event_type), now)
                .map_err(|e| WebhookError::InvalidTransition(e.to_string()))?,
            _ => intent
                .transition_to(target, now)
                .map_err(|e| WebhookError::InvalidTransition(e.to_string()))?,
        }
        self.store.put(&intent).await?;
        tracing::info!(
            intent_id = %intent.id,
            provider = %intent.provider,
            status = %intent.status,
            event_id = %event.provider_event_id,
            "payment status updated from webhook"
        );

        if intent.is_succeeded() {
            fulfill(self.fulfillment.as_ref(), &intent).await;
        }

        Ok(HandleWebhookResult::Processed {
            intent_id: intent.id,
            status: intent.status,
            changed: true,
        })
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, WebhookError> {
        self.events.save(record).await.map_err(storage_error)
    }
}

fn storage_error(err: DomainError) -> WebhookError {
    WebhookError::Storage(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryIntentStore, InMemoryWebhookEventRepository};
    use crate::adapters::providers::MockProviderAdapter;
    use crate::application::handlers::payments::test_support::{
        created_intent, RecordingFulfillment,
    };
    use crate::domain::payment::{CheckoutDetails, PaymentIntent};
    use crate::domain::webhook::{sign_payload, RecentEventCache};
    use crate::ports::ProcessingResult;
    use secrecy::Secret;
    use serde_json::json;
    use std::time::Duration;

    const SECRET: &str = "whsec_test";

    struct Fixture {
        handler: HandleWebhookHandler,
        store: Arc<InMemoryIntentStore>,
        events: Arc<InMemoryWebhookEventRepository>,
        fulfillment: Arc<RecordingFulfillment>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryIntentStore::new());
        let events = Arc::new(InMemoryWebhookEventRepository::new());
        let fulfillment = Arc::new(RecordingFulfillment::default());
        let registry = ProviderRegistry::new()
            .with(Arc::new(MockProviderAdapter::new(ProviderKind::Crypto)))
            .with(Arc::new(
                MockProviderAdapter::new(ProviderKind::BankTransfer).without_callbacks(),
            ));
        let verifier = WebhookVerifier::new(RecentEventCache::new(100, Duration::from_secs(60)))
            .with_secret(ProviderKind::Crypto, Secret::new(SECRET.to_string()))
            .with_secret(ProviderKind::BankTransfer, Secret::new(SECRET.to_string()));
        let handler = HandleWebhookHandler::new(
            store.clone(),
            events.clone(),
            Arc::new(registry),
            Arc::new(verifier),
            Arc::new(IntentLocks::new()),
            fulfillment.clone(),
        );
        Fixture {
            handler,
            store,
            events,
            fulfillment,
        }
    }

    async fn pending_intent(store: &InMemoryIntentStore, external_id: &str) -> PaymentIntent {
        let mut intent = created_intent("order-1", Timestamp::now());
        intent.provider = ProviderKind::Crypto;
        store.insert_new(&intent).await.unwrap();
        intent
            .record_provider_payment(
                external_id.to_string(),
                CheckoutDetails::default(),
                false,
                Timestamp::now(),
            )
            .unwrap();
        store.put(&intent).await.unwrap();
        intent
    }

    fn signed(event_id: &str, event_type: &str, external_id: &str) -> HandleWebhookCommand {
        let payload = serde_json::to_vec(&json!({
            "id": event_id,
            "type": event_type,
            "external_id": external_id,
        }))
        .unwrap();
        let signature = sign_payload(ProviderKind::Crypto, SECRET, 0, &payload).unwrap();
        HandleWebhookCommand {
            provider: "crypto".to_string(),
            payload,
            signature: Some(signature),
        }
    }

    #[tokio::test]
    async fn success_callback_completes_intent_and_fulfills_once() {
        let f = fixture();
        let intent = pending_intent(&f.store, "ext_1").await;

        let result = f
            .handler
            .handle(signed("evt_1", "payment.succeeded", "ext_1"))
            .await
            .unwrap();

        assert_eq!(
            result,
            HandleWebhookResult::Processed {
                intent_id: intent.id,
                status: IntentStatus::Succeeded,
                changed: true,
            }
        );
        assert_eq!(f.fulfillment.succeeded(), vec![intent.id]);
        let record = f
            .events
            .find_by_event_id(ProviderKind::Crypto, "evt_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.result, ProcessingResult::Success);
    }

    #[tokio::test]
    async fn redelivered_event_is_duplicate() {
        let f = fixture();
        pending_intent(&f.store, "ext_1").await;
        let cmd = signed("evt_1", "payment.succeeded", "ext_1");

        f.handler.handle(cmd.clone()).await.unwrap();
        let second = f.handler.handle(cmd).await.unwrap();

        assert_eq!(second, HandleWebhookResult::Duplicate);
        assert_eq!(f.fulfillment.succeeded().len(), 1);
    }

    #[tokio::test]
    async fn second_success_event_does_not_refulfill() {
        let f = fixture();
        pending_intent(&f.store, "ext_1").await;

        f.handler
            .handle(signed("evt_1", "payment.succeeded", "ext_1"))
            .await
            .unwrap();
        let second = f
            .handler
            .handle(signed("evt_2", "payment.succeeded", "ext_1"))
            .await
            .unwrap();

        assert!(matches!(
            second,
            HandleWebhookResult::Processed { changed: false, .. }
        ));
        assert_eq!(f.fulfillment.succeeded().len(), 1);
    }

    #[tokio::test]
    async fn failure_after_success_is_ignored() {
        let f = fixture();
        let intent = pending_intent(&f.store, "ext_1").await;

        f.handler
            .handle(signed("evt_1", "payment.succeeded", "ext_1"))
            .await
            .unwrap();
        let result = f
            .handler
            .handle(signed("evt_2", "payment.failed", "ext_1"))
            .await
            .unwrap();

        assert_eq!(
            result,
            HandleWebhookResult::Processed {
                intent_id: intent.id,
                status: IntentStatus::Succeeded,
                changed: false,
            }
        );
    }

    #[tokio::test]
    async fn failure_callback_records_reason() {
        let f = fixture();
        let intent = pending_intent(&f.store, "ext_1").await;

        f.handler
            .handle(signed("evt_1", "payment.failed", "ext_1"))
            .await
            .unwrap();

        let stored = f.store.get_by_id(&intent.id).await.unwrap().unwrap();
        assert_eq!(stored.status, IntentStatus::Failed);
        assert!(stored.failure_reason.unwrap().contains("payment.failed"));
        assert!(f.fulfillment.succeeded().is_empty());
    }

    #[tokio::test]
    async fn concurrent_success_events_fulfill_once() {
        let f = fixture();
        pending_intent(&f.store, "ext_1").await;
        let handler = Arc::new(f.handler);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let handler = handler.clone();
                let cmd = signed(&format!("evt_{}", i), "payment.succeeded", "ext_1");
                tokio::spawn(async move { handler.handle(cmd).await })
            })
            .collect();
        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(f.fulfillment.succeeded().len(), 1);
    }

    #[tokio::test]
    async fn tampered_payload_is_rejected_without_state_change() {
        let f = fixture();
        let intent = pending_intent(&f.store, "ext_1").await;
        let mut cmd = signed("evt_1", "payment.succeeded", "ext_1");
        cmd.payload.push(b' ');

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::InvalidSignature));
        let stored = f.store.get_by_id(&intent.id).await.unwrap().unwrap();
        assert_eq!(stored.status, IntentStatus::Pending);
        assert!(f.events.is_empty().await);
    }

    #[tokio::test]
    async fn missing_signature_is_rejected() {
        let f = fixture();
        let mut cmd = signed("evt_1", "payment.succeeded", "ext_1");
        cmd.signature = None;

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::MissingSignature));
    }

    #[tokio::test]
    async fn unknown_event_type_is_acknowledged_and_recorded() {
        let f = fixture();

        let result = f
            .handler
            .handle(signed("evt_1", "payment.refunded", "ext_1"))
            .await
            .unwrap();

        assert_eq!(result, HandleWebhookResult::Ignored);
        let record = f
            .events
            .find_by_event_id(ProviderKind::Crypto, "evt_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.result, ProcessingResult::Ignored);
    }

    #[tokio::test]
    async fn unknown_payment_is_retryable_and_not_recorded() {
        let f = fixture();

        let err = f
            .handler
            .handle(signed("evt_1", "payment.succeeded", "ext_missing"))
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::IntentNotFound(_)));
        assert!(err.is_retryable());
        assert!(f.events.is_empty().await);
    }

    #[tokio::test]
    async fn provider_without_callbacks_is_rejected() {
        let f = fixture();
        let mut cmd = signed("evt_1", "payment.succeeded", "ext_1");
        cmd.provider = "bank_transfer".to_string();

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::CallbacksNotAccepted(_)));
    }

    #[tokio::test]
    async fn unregistered_provider_is_rejected() {
        let f = fixture();
        let mut cmd = signed("evt_1", "payment.succeeded", "ext_1");
        cmd.provider = "wallet".to_string();

        let err = f.handler.handle(cmd).await.unwrap_err();

        assert!(matches!(err, WebhookError::UnsupportedProvider(_)));
    }
}
