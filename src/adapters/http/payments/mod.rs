//! HTTP adapter for payment endpoints.
//!
//! - `POST /payments` - Create a payment intent
//! - `GET /payments/:intent_id` - Poll an intent
//! - `GET /payment-methods/:country` - Checkout method picker
//! - `POST /webhooks/:provider` - Provider callbacks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{CreatePaymentRequest, PaymentResponse, WebhookAck};
pub use handlers::{IDEMPOTENCY_KEY_HEADER, IDEMPOTENT_REPLAYED_HEADER};
pub use routes::payment_routes;
