//! PaymentOrchestrator - single entry point for the payment handlers.
//!
//! Owns the per-intent lock table shared by checkout, polling and webhook
//! handling, so all three serialize on the same intent.

use std::sync::Arc;

use super::handlers::{
    CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult, GetPaymentHandler,
    GetPaymentQuery, HandleWebhookCommand, HandleWebhookHandler, HandleWebhookResult,
    ListPaymentMethodsHandler, ListPaymentMethodsQuery,
};
use super::{IntentLocks, ProviderRegistry};
use crate::domain::payment::{CountryMethods, PaymentError, PaymentIntent};
use crate::domain::webhook::{WebhookError, WebhookVerifier};
use crate::ports::{FulfillmentHook, IntentStore, WebhookEventRepository};

/// Ports and settings the orchestrator is built from.
pub struct OrchestratorDeps {
    pub store: Arc<dyn IntentStore>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub registry: Arc<ProviderRegistry>,
    pub verifier: Arc<WebhookVerifier>,
    pub fulfillment: Arc<dyn FulfillmentHook>,
    pub intent_ttl_secs: u64,
}

pub struct PaymentOrchestrator {
    registry: Arc<ProviderRegistry>,
    create: CreatePaymentHandler,
    get: GetPaymentHandler,
    webhook: HandleWebhookHandler,
    methods: ListPaymentMethodsHandler,
}

impl PaymentOrchestrator {
    pub fn new(deps: OrchestratorDeps) -> Self {
        let locks = Arc::new(IntentLocks::new());
        Self {
            create: CreatePaymentHandler::new(
                deps.store.clone(),
                deps.registry.clone(),
                locks.clone(),
                deps.fulfillment.clone(),
                deps.intent_ttl_secs,
            ),
            get: GetPaymentHandler::new(deps.store.clone(), locks.clone(), deps.intent_ttl_secs),
            webhook: HandleWebhookHandler::new(
                deps.store,
                deps.webhook_events,
                deps.registry.clone(),
                deps.verifier,
                locks,
                deps.fulfillment,
            ),
            methods: ListPaymentMethodsHandler::new(deps.registry.clone()),
            registry: deps.registry,
        }
    }

    pub async fn create_payment(
        &self,
        cmd: CreatePaymentCommand,
    ) -> Result<CreatePaymentResult, PaymentError> {
        self.create.handle(cmd).await
    }

    pub async fn get_payment(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        self.get
            .handle(GetPaymentQuery {
                intent_id: intent_id.to_string(),
            })
            .await
    }

    pub async fn handle_webhook(
        &self,
        cmd: HandleWebhookCommand,
    ) -> Result<HandleWebhookResult, WebhookError> {
        self.webhook.handle(cmd).await
    }

    pub fn payment_methods(&self, country: &str) -> Result<CountryMethods, PaymentError> {
        self.methods.handle(ListPaymentMethodsQuery {
            country: country.to_string(),
        })
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.registry
    }
}
