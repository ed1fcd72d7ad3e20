//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod payments;

pub use payments::{
    CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult, GetPaymentHandler,
    GetPaymentQuery, HandleWebhookCommand, HandleWebhookHandler, HandleWebhookResult,
    ListPaymentMethodsHandler, ListPaymentMethodsQuery,
};
