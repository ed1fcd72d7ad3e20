//! Exchange rates and price conversion arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::foundation::{Currency, Timestamp, ValidationError};

/// Decimal places of a converted display price.
pub const CONVERTED_SCALE: u32 = 2;

/// A quoted rate for one currency pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRate {
    pub from: Currency,
    pub to: Currency,
    pub rate: Decimal,
    pub fetched_at: Timestamp,
}

impl ExchangeRate {
    /// Identity rate for same-currency conversion.
    pub fn identity(currency: Currency) -> Self {
        Self {
            from: currency.clone(),
            to: currency,
            rate: Decimal::ONE,
            fetched_at: Timestamp::now(),
        }
    }

    /// True when younger than `ttl_secs` at `now`.
    pub fn is_fresh(&self, ttl_secs: u64, now: Timestamp) -> bool {
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        now.duration_since(&self.fetched_at).num_seconds() < ttl
    }
}

/// Rounds half away from zero to two decimals.
pub fn round_price(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CONVERTED_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Multiplies and rounds; same-currency amounts pass through untouched.
///
/// Fails when the product does not fit in a `Decimal`.
pub fn apply_rate(amount: Decimal, rate: &ExchangeRate) -> Result<Decimal, ValidationError> {
    if rate.from == rate.to {
        return Ok(amount);
    }
    amount
        .checked_mul(rate.rate)
        .map(round_price)
        .ok_or_else(|| ValidationError::invalid_format("amount", "out of range for conversion"))
}

/// Rejects negative amounts; conversion of prices only.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, ValidationError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::invalid_format(
            "amount",
            "must not be negative",
        ));
    }
    Ok(amount)
}

/// Result of converting one amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub from_currency: Currency,
    pub to_currency: Currency,
    #[serde(with = "rust_decimal::serde::float")]
    pub original_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub converted_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rate(from: &str, to: &str, r: &str) -> ExchangeRate {
        ExchangeRate {
            from: Currency::new(from).unwrap(),
            to: Currency::new(to).unwrap(),
            rate: dec(r),
            fetched_at: Timestamp::now(),
        }
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_price(dec("1.005")), dec("1.01"));
        assert_eq!(round_price(dec("1.004")), dec("1.00"));
        assert_eq!(round_price(dec("2.675")), dec("2.68"));
    }

    #[test]
    fn converts_with_rate() {
        let r = rate("USD", "IDR", "15500.5");
        assert_eq!(apply_rate(dec("47"), &r).unwrap(), dec("728523.50"));
    }

    #[test]
    fn same_currency_is_unchanged() {
        let r = ExchangeRate::identity(Currency::usd());
        assert_eq!(apply_rate(dec("47.123"), &r).unwrap(), dec("47.123"));
    }

    #[test]
    fn overflowing_product_is_rejected() {
        let r = rate("USD", "IDR", "16250.5");
        assert!(apply_rate(Decimal::MAX, &r).is_err());
    }

    #[test]
    fn freshness_follows_ttl() {
        let r = rate("USD", "EUR", "0.9");
        let now = r.fetched_at;
        assert!(r.is_fresh(3600, now.plus_secs(3599)));
        assert!(!r.is_fresh(3600, now.plus_secs(3600)));
    }

    #[test]
    fn huge_ttl_never_expires() {
        let r = rate("USD", "EUR", "0.9");
        assert!(r.is_fresh(u64::MAX, r.fetched_at.plus_secs(86_400)));
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(validate_amount(dec("-1")).is_err());
        assert!(validate_amount(dec("0")).is_ok());
    }

    #[test]
    fn conversion_serializes_as_numbers() {
        let c = Conversion {
            from_currency: Currency::usd(),
            to_currency: Currency::new("EUR").unwrap(),
            original_amount: dec("10"),
            converted_amount: dec("9.2"),
            rate: dec("0.92"),
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["fromCurrency"], "USD");
        assert_eq!(json["convertedAmount"], 9.2);
        assert_eq!(json["rate"], 0.92);
    }

    proptest! {
        #[test]
        fn rounded_price_has_at_most_two_decimals(units in 0i64..10_000_000_000, scale in 0u32..8) {
            let amount = Decimal::new(units, scale);
            prop_assert!(round_price(amount).scale() <= CONVERTED_SCALE);
        }

        #[test]
        fn rounding_moves_less_than_half_a_cent(units in 0i64..10_000_000_000, scale in 0u32..8) {
            let amount = Decimal::new(units, scale);
            let diff = (round_price(amount) - amount).abs();
            prop_assert!(diff <= dec("0.005"));
        }
    }
}
