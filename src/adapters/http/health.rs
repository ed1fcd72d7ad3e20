//! Liveness endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::domain::foundation::Timestamp;
use crate::domain::payment::ProviderKind;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub providers: Vec<ProviderKind>,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Timestamp::now().to_rfc3339(),
        providers: state.orchestrator.providers().kinds(),
    })
}
