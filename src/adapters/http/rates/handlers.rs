//! HTTP handler for price conversion.

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::AppState;
use crate::domain::currency::CurrencyError;
use crate::domain::foundation::{Currency, ValidationError};

/// GET /rates/:from/:to/:amount - Convert a price
pub async fn convert(
    State(state): State<AppState>,
    Path((from, to, amount)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let from = Currency::new(&from).map_err(CurrencyError::from)?;
    let to = Currency::new(&to).map_err(CurrencyError::from)?;
    let amount = Decimal::from_str(amount.trim())
        .map_err(|_| CurrencyError::from(ValidationError::invalid_format("amount", "not a number")))?;

    let conversion = state.converter.convert(amount, &from, &to).await?;
    Ok(Json(conversion))
}
