//! Payment domain: intents, their lifecycle, and provider routing.

mod errors;
mod intent;
pub mod method_catalog;
mod provider;
mod status;

pub use errors::PaymentError;
pub use intent::{
    CheckoutDetails, IntentDraft, PaymentIntent, MAX_AMOUNT_MINOR_UNITS, MAX_METADATA_ENTRIES,
    MAX_METADATA_KEY_LEN, MAX_METADATA_VALUE_LEN, MIN_AMOUNT_MINOR_UNITS,
};
pub use method_catalog::{CountryCode, CountryMethods, MethodOption};
pub use provider::{ProviderKind, RegionalIntegration, RegionalMethod};
pub use status::IntentStatus;
