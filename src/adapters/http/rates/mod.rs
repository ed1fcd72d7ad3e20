//! HTTP adapter for exchange rates.
//!
//! - `GET /rates/:from/:to/:amount` - Convert an amount between currencies

pub mod handlers;

use axum::{routing::get, Router};

use super::AppState;

pub fn rate_routes() -> Router<AppState> {
    Router::new().route("/rates/:from/:to/:amount", get(handlers::convert))
}
