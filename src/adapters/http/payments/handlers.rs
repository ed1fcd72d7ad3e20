//! HTTP handlers for checkout, polling, method listing and provider callbacks.

use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use super::dto::{CreatePaymentRequest, PaymentResponse, WebhookAck};
use crate::adapters::http::error::ApiError;
use crate::adapters::http::AppState;
use crate::application::{CreatePaymentCommand, HandleWebhookCommand, HandleWebhookResult};
use crate::domain::payment::ProviderKind;
use crate::domain::webhook::signature_header_name;

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
pub const IDEMPOTENT_REPLAYED_HEADER: &str = "Idempotent-Replayed";

/// POST /payments - Create a payment, or replay the one created for this key
pub async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;

    let idempotency_key = request
        .idempotency_key
        .or_else(|| header_str(&headers, IDEMPOTENCY_KEY_HEADER).map(str::to_string))
        .unwrap_or_default();

    let cmd = CreatePaymentCommand {
        idempotency_key,
        provider: request.provider,
        method: request.method,
        country: request.country,
        amount_minor_units: request.amount,
        currency: request.currency,
        customer_email: request.customer_email,
        metadata: request.metadata,
    };

    let result = state.orchestrator.create_payment(cmd).await?;

    let mut response_headers = HeaderMap::new();
    if result.replayed {
        response_headers.insert(IDEMPOTENT_REPLAYED_HEADER, HeaderValue::from_static("true"));
    }

    Ok((
        StatusCode::CREATED,
        response_headers,
        Json(PaymentResponse::from(result.intent)),
    ))
}

/// GET /payments/:intent_id - Poll an intent
pub async fn get_payment(
    State(state): State<AppState>,
    Path(intent_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let intent = state.orchestrator.get_payment(&intent_id).await?;
    Ok(Json(PaymentResponse::from(intent)))
}

/// GET /payment-methods/:country - Methods a buyer in `country` can use
pub async fn list_payment_methods(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state.orchestrator.payment_methods(&country)?;
    Ok(Json(listing))
}

/// POST /webhooks/:provider - Provider callback
///
/// Duplicates and ignored event types are acknowledged like processed ones,
/// so the provider stops redelivering them.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = provider
        .parse::<ProviderKind>()
        .ok()
        .and_then(|kind| header_str(&headers, signature_header_name(kind)))
        .map(str::to_string);

    let cmd = HandleWebhookCommand {
        provider,
        payload: body.to_vec(),
        signature,
    };

    match state.orchestrator.handle_webhook(cmd).await? {
        HandleWebhookResult::Processed {
            intent_id, status, ..
        } => {
            tracing::debug!(intent_id = %intent_id, status = %status, "webhook processed");
        }
        HandleWebhookResult::Duplicate | HandleWebhookResult::Ignored => {}
    }

    Ok(Json(WebhookAck { received: true }))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
