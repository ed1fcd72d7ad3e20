//! Payment provider adapters.
//!
//! One [`ProviderAdapter`](crate::ports::ProviderAdapter) per processor the
//! storefront can route a checkout to, plus a configurable mock for tests.

mod bank_transfer;
mod card;
mod crypto;
mod http_support;
mod mock;
mod regional;
mod wallet;

pub use bank_transfer::{transfer_reference, BankTransferAdapter};
pub use card::CardAdapter;
pub use crypto::CryptoAdapter;
pub use mock::{MockBehavior, MockProviderAdapter};
pub use regional::RegionalAdapter;
pub use wallet::WalletAdapter;
