//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `providers` - Payment processor integrations
//! - `memory` / `postgres` - Intent and processed-webhook storage
//! - `rates` - Exchange rate sources
//! - `fulfillment` - Fulfillment hooks
//! - `http` - REST API

pub mod fulfillment;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod providers;
pub mod rates;

pub use fulfillment::LoggingFulfillment;
pub use http::{router, AppState};
pub use memory::{InMemoryIntentStore, InMemoryWebhookEventRepository};
pub use postgres::{PostgresIntentStore, PostgresWebhookEventRepository};
pub use rates::ExchangeRateApiSource;
