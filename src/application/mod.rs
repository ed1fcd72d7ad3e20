//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

mod currency_converter;
pub mod handlers;
mod intent_locks;
mod orchestrator;
mod provider_registry;

pub use currency_converter::CurrencyConverter;
pub use handlers::{
    CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult, GetPaymentHandler,
    GetPaymentQuery, HandleWebhookCommand, HandleWebhookHandler, HandleWebhookResult,
    ListPaymentMethodsHandler, ListPaymentMethodsQuery,
};
pub use intent_locks::IntentLocks;
pub use orchestrator::{OrchestratorDeps, PaymentOrchestrator};
pub use provider_registry::ProviderRegistry;
