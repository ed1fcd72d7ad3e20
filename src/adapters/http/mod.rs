//! HTTP adapters - REST API implementations.
//!
//! The payment and rate endpoints share one [`AppState`]; [`router`] builds
//! the full API without middleware, which the binary adds.

pub mod error;
pub mod health;
pub mod payments;
pub mod rates;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::application::{CurrencyConverter, PaymentOrchestrator};

pub use error::{ApiError, ErrorResponse};
pub use payments::{IDEMPOTENCY_KEY_HEADER, IDEMPOTENT_REPLAYED_HEADER};

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PaymentOrchestrator>,
    pub converter: Arc<CurrencyConverter>,
}

/// Create the complete API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(payments::payment_routes())
        .merge(rates::rate_routes())
        .route("/health", get(health::health))
        .with_state(state)
}
