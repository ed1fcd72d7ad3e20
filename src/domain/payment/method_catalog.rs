//! Country routing: which payment methods a buyer in a given country sees.

use serde::Serialize;

use super::provider::{ProviderKind, RegionalMethod};
use crate::domain::foundation::{Currency, ValidationError};

/// Providers offered in every country.
pub const GLOBAL_PROVIDERS: [ProviderKind; 4] = [
    ProviderKind::Card,
    ProviderKind::Wallet,
    ProviderKind::Crypto,
    ProviderKind::BankTransfer,
];

/// Two-letter ISO 3166-1 country code, upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(code: impl AsRef<str>) -> Result<Self, ValidationError> {
        let code = code.as_ref().trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::invalid_format(
                "country",
                format!("'{}' is not a two-letter country code", code),
            ));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Regional methods listed for a country, in checkout display order.
pub fn regional_methods(country: &CountryCode) -> &'static [RegionalMethod] {
    use RegionalMethod::*;
    match country.as_str() {
        "ID" => &[Midtrans, GoPay, Ovo, Dana],
        "MY" => &[Fpx, GrabPay],
        "SG" => &[PayNow, GrabPay],
        "TH" => &[PromptPay, TrueMoney],
        "VN" => &[Momo, ZaloPay],
        "PH" => &[GCash, PayMaya],
        "IN" => &[Upi, Paytm, Razorpay],
        "BR" => &[Pix, Boleto],
        "MX" => &[Oxxo, Spei],
        "CN" => &[Alipay, WeChatPay],
        _ => &[],
    }
}

/// Local settlement currency for a country, USD when unknown.
pub fn local_currency(country: &CountryCode) -> Currency {
    let code = match country.as_str() {
        "ID" => "IDR",
        "MY" => "MYR",
        "SG" => "SGD",
        "TH" => "THB",
        "VN" => "VND",
        "PH" => "PHP",
        "IN" => "INR",
        "BR" => "BRL",
        "MX" => "MXN",
        "CN" => "CNY",
        "JP" => "JPY",
        "KR" => "KRW",
        _ => return Currency::usd(),
    };
    Currency::new(code).unwrap_or_else(|_| Currency::usd())
}

/// True when `method` is listed for `country`.
pub fn is_offered_in(method: RegionalMethod, country: &CountryCode) -> bool {
    regional_methods(country).contains(&method)
}

/// One selectable entry on the checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodOption {
    pub provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<RegionalMethod>,
    pub name: &'static str,
    pub available: bool,
}

/// Everything a buyer in one country can pay with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryMethods {
    pub country: CountryCode,
    pub currency: Currency,
    pub methods: Vec<MethodOption>,
}

/// Builds the method list for a country.
///
/// `enabled` reports whether a provider is configured in this deployment;
/// regional methods are additionally gated on having an integration.
pub fn methods_for(country: CountryCode, enabled: impl Fn(ProviderKind) -> bool) -> CountryMethods {
    let mut methods: Vec<MethodOption> = GLOBAL_PROVIDERS
        .iter()
        .map(|&provider| MethodOption {
            provider,
            method: None,
            name: global_display_name(provider),
            available: enabled(provider),
        })
        .collect();

    let regional_enabled = enabled(ProviderKind::Regional);
    methods.extend(regional_methods(&country).iter().map(|&method| MethodOption {
        provider: ProviderKind::Regional,
        method: Some(method),
        name: method.display_name(),
        available: regional_enabled && method.is_integrated(),
    }));

    CountryMethods {
        currency: local_currency(&country),
        country,
        methods,
    }
}

fn global_display_name(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::Card => "Credit / Debit Card",
        ProviderKind::Wallet => "PayPal",
        ProviderKind::Crypto => "Cryptocurrency",
        ProviderKind::Regional => "Local Payment",
        ProviderKind::BankTransfer => "Bank Transfer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country(code: &str) -> CountryCode {
        CountryCode::new(code).unwrap()
    }

    #[test]
    fn country_code_normalizes_case() {
        assert_eq!(country("id").as_str(), "ID");
        assert!(CountryCode::new("IDN").is_err());
        assert!(CountryCode::new("1D").is_err());
    }

    #[test]
    fn indonesia_lists_its_wallets() {
        let methods = regional_methods(&country("ID"));
        assert_eq!(
            methods,
            &[
                RegionalMethod::Midtrans,
                RegionalMethod::GoPay,
                RegionalMethod::Ovo,
                RegionalMethod::Dana
            ]
        );
    }

    #[test]
    fn unknown_country_has_no_regional_methods_and_pays_in_usd() {
        assert!(regional_methods(&country("US")).is_empty());
        assert_eq!(local_currency(&country("US")), Currency::usd());
    }

    #[test]
    fn japan_has_a_currency_but_no_regional_methods() {
        assert_eq!(local_currency(&country("JP")).as_str(), "JPY");
        assert!(regional_methods(&country("JP")).is_empty());
    }

    #[test]
    fn method_offer_is_country_specific() {
        assert!(is_offered_in(RegionalMethod::Pix, &country("BR")));
        assert!(!is_offered_in(RegionalMethod::Pix, &country("ID")));
    }

    #[test]
    fn methods_for_always_lists_global_providers() {
        let listing = methods_for(country("DE"), |_| true);
        let providers: Vec<_> = listing.methods.iter().map(|m| m.provider).collect();
        assert_eq!(providers, GLOBAL_PROVIDERS.to_vec());
    }

    #[test]
    fn unintegrated_regional_methods_are_unavailable() {
        let listing = methods_for(country("BR"), |_| true);
        let boleto = listing
            .methods
            .iter()
            .find(|m| m.method == Some(RegionalMethod::Boleto))
            .unwrap();
        let pix = listing
            .methods
            .iter()
            .find(|m| m.method == Some(RegionalMethod::Pix))
            .unwrap();

        assert!(!boleto.available);
        assert!(pix.available);
        assert_eq!(listing.currency.as_str(), "BRL");
    }

    #[test]
    fn unconfigured_providers_are_unavailable() {
        let listing = methods_for(country("PH"), |p| p == ProviderKind::Card);
        assert!(listing.methods.iter().all(|m| m.available == (m.provider == ProviderKind::Card)));
    }
}
