//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Payment Ports
//!
//! - `ProviderAdapter` - One per payment processor (create + callback parsing)
//! - `IntentStore` - Idempotency key → payment intent persistence
//! - `FulfillmentHook` - Side effect run once per succeeded intent
//!
//! ## Webhook Ports
//!
//! - `WebhookEventRepository` - Processed callback tracking per provider
//!
//! ## Currency Ports
//!
//! - `ExchangeRateSource` - Live exchange rate quotes

mod exchange_rate_source;
mod fulfillment;
mod intent_store;
mod payment_provider;
mod webhook_event_repository;

pub use exchange_rate_source::{ExchangeRateSource, RateTable};
pub use fulfillment::FulfillmentHook;
pub use intent_store::{check_status_progression, InsertResult, IntentStore, IntentStoreError};
pub use payment_provider::{
    ProviderAdapter, ProviderError, ProviderErrorCode, ProviderPayment, ProviderPaymentRequest,
};
pub use webhook_event_repository::{
    ProcessingResult, SaveResult, WebhookEventRecord, WebhookEventRepository,
};
