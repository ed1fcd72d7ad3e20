//! In-memory storage adapters, used when no database is configured.

mod intent_store;
mod webhook_event_repository;

pub use intent_store::InMemoryIntentStore;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
