//! Currency domain: exchange rates and conversion rules.

mod conversion;
mod errors;

pub use conversion::{
    apply_rate, round_price, validate_amount, Conversion, ExchangeRate, CONVERTED_SCALE,
};
pub use errors::CurrencyError;
