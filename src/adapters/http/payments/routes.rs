//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{create_payment, get_payment, handle_webhook, list_payment_methods};
use crate::adapters::http::AppState;

/// Create the payment API router.
///
/// # Routes
///
/// - `POST /payments` - Create (or replay) a payment
/// - `GET /payments/:intent_id` - Poll an intent
/// - `GET /payment-methods/:country` - Methods offered in a country
/// - `POST /webhooks/:provider` - Provider callbacks (signature verified)
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments/:intent_id", get(get_payment))
        .route("/payment-methods/:country", get(list_payment_methods))
        .route("/webhooks/:provider", post(handle_webhook))
}
