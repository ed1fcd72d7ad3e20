//! ListPaymentMethodsHandler - Query handler for the checkout method picker.

use std::sync::Arc;

use crate::application::ProviderRegistry;
use crate::domain::payment::{method_catalog, CountryCode, CountryMethods, PaymentError};

/// Query for the methods offered in one country.
#[derive(Debug, Clone)]
pub struct ListPaymentMethodsQuery {
    pub country: String,
}

/// Handler for method listings.
pub struct ListPaymentMethodsHandler {
    registry: Arc<ProviderRegistry>,
}

impl ListPaymentMethodsHandler {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Lists every method for the country; `available` is false for
    /// providers that are not configured or methods they cannot serve.
    pub fn handle(&self, query: ListPaymentMethodsQuery) -> Result<CountryMethods, PaymentError> {
        let country = CountryCode::new(query.country.trim())?;
        let mut listing = method_catalog::methods_for(country, |kind| self.registry.is_enabled(kind));

        for option in listing.methods.iter_mut().filter(|o| o.available) {
            option.available = self
                .registry
                .get(option.provider)
                .map(|adapter| adapter.supports_method(option.method))
                .unwrap_or(false);
        }
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::providers::MockProviderAdapter;
    use crate::domain::payment::{ProviderKind, RegionalMethod};

    fn handler(kinds: &[ProviderKind]) -> ListPaymentMethodsHandler {
        let registry = kinds.iter().fold(ProviderRegistry::new(), |registry, &kind| {
            registry.with(Arc::new(MockProviderAdapter::new(kind)))
        });
        ListPaymentMethodsHandler::new(Arc::new(registry))
    }

    fn query(country: &str) -> ListPaymentMethodsQuery {
        ListPaymentMethodsQuery {
            country: country.to_string(),
        }
    }

    #[test]
    fn lists_regional_methods_with_local_currency() {
        let listing = handler(&ProviderKind::ALL).handle(query("br")).unwrap();

        assert_eq!(listing.country.as_str(), "BR");
        assert_eq!(listing.currency.as_str(), "BRL");
        let pix = listing
            .methods
            .iter()
            .find(|m| m.method == Some(RegionalMethod::Pix))
            .unwrap();
        assert!(pix.available);
        let boleto = listing
            .methods
            .iter()
            .find(|m| m.method == Some(RegionalMethod::Boleto))
            .unwrap();
        assert!(!boleto.available);
    }

    #[test]
    fn unconfigured_providers_are_listed_unavailable() {
        let listing = handler(&[ProviderKind::Card]).handle(query("US")).unwrap();

        for option in &listing.methods {
            assert_eq!(option.available, option.provider == ProviderKind::Card);
        }
    }

    #[test]
    fn invalid_country_is_validation_error() {
        let err = handler(&[]).handle(query("USA")).unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));
    }
}
