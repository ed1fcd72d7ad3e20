//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use rust_decimal::Decimal;
use secrecy::Secret;

use storefront_payments::adapters::http::{router, AppState};
use storefront_payments::adapters::providers::MockProviderAdapter;
use storefront_payments::adapters::{InMemoryIntentStore, InMemoryWebhookEventRepository};
use storefront_payments::application::{
    CurrencyConverter, OrchestratorDeps, PaymentOrchestrator, ProviderRegistry,
};
use storefront_payments::domain::currency::CurrencyError;
use storefront_payments::domain::foundation::{Currency, DomainError, IntentId};
use storefront_payments::domain::payment::{PaymentIntent, ProviderKind};
use storefront_payments::domain::webhook::{RecentEventCache, WebhookVerifier};
use storefront_payments::ports::{ExchangeRateSource, FulfillmentHook, RateTable};

pub const CARD_SECRET: &str = "whsec_card_test";
pub const CRYPTO_SECRET: &str = "crypto_callback_secret";

/// Fixed USD quotes.
pub struct StaticRates;

#[async_trait]
impl ExchangeRateSource for StaticRates {
    async fn latest(&self, base: &Currency) -> Result<RateTable, CurrencyError> {
        if base.as_str() != "USD" {
            return Err(CurrencyError::rate_unavailable(base.as_str(), "*", "no quotes"));
        }
        let rates = [("EUR", "0.9234"), ("IDR", "15650"), ("GBP", "0.79")]
            .into_iter()
            .map(|(code, rate)| (code.to_string(), Decimal::from_str(rate).unwrap()))
            .collect::<HashMap<_, _>>();
        Ok(RateTable {
            base: base.clone(),
            rates,
        })
    }
}

/// Records every intent handed to fulfillment.
#[derive(Default)]
pub struct RecordingFulfillment {
    fulfilled: Mutex<Vec<IntentId>>,
}

impl RecordingFulfillment {
    pub fn fulfilled(&self) -> Vec<IntentId> {
        self.fulfilled.lock().unwrap().clone()
    }
}

#[async_trait]
impl FulfillmentHook for RecordingFulfillment {
    async fn on_payment_succeeded(&self, intent: &PaymentIntent) -> Result<(), DomainError> {
        self.fulfilled.lock().unwrap().push(intent.id);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub card: Arc<MockProviderAdapter>,
    pub crypto: Arc<MockProviderAdapter>,
    pub regional: Arc<MockProviderAdapter>,
    pub bank: Arc<MockProviderAdapter>,
    pub fulfillment: Arc<RecordingFulfillment>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_card(MockProviderAdapter::new(ProviderKind::Card))
    }

    pub fn with_card(card: MockProviderAdapter) -> Self {
        let card = Arc::new(card);
        let crypto = Arc::new(MockProviderAdapter::new(ProviderKind::Crypto));
        let regional = Arc::new(MockProviderAdapter::new(ProviderKind::Regional));
        let bank = Arc::new(MockProviderAdapter::new(ProviderKind::BankTransfer).without_callbacks());

        let registry = ProviderRegistry::new()
            .with(card.clone())
            .with(crypto.clone())
            .with(regional.clone())
            .with(bank.clone());
        let verifier = WebhookVerifier::new(RecentEventCache::new(1000, Duration::from_secs(60)))
            .with_secret(ProviderKind::Card, Secret::new(CARD_SECRET.to_string()))
            .with_secret(ProviderKind::Crypto, Secret::new(CRYPTO_SECRET.to_string()));

        let fulfillment = Arc::new(RecordingFulfillment::default());
        let orchestrator = PaymentOrchestrator::new(OrchestratorDeps {
            store: Arc::new(InMemoryIntentStore::new()),
            webhook_events: Arc::new(InMemoryWebhookEventRepository::new()),
            registry: Arc::new(registry),
            verifier: Arc::new(verifier),
            fulfillment: fulfillment.clone(),
            intent_ttl_secs: 3600,
        });
        let state = AppState {
            orchestrator: Arc::new(orchestrator),
            converter: Arc::new(CurrencyConverter::new(Arc::new(StaticRates), 3600)),
        };

        Self {
            router: router(state),
            card,
            crypto,
            regional,
            bank,
            fulfillment,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
