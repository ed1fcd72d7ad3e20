//! PostgreSQL adapters - Database implementations for storage ports.
//!
//! - `PostgresIntentStore` - payment intents, unique on idempotency key
//! - `PostgresWebhookEventRepository` - processed webhook ledger

mod intent_store;
mod webhook_event_repository;

pub use intent_store::PostgresIntentStore;
pub use webhook_event_repository::PostgresWebhookEventRepository;
