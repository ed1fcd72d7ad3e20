//! Payment configuration
//!
//! One optional section per provider. A provider without a section is not
//! registered and requests naming it are rejected.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::collections::HashMap;

use super::error::ValidationError;
use crate::domain::payment::ProviderKind;

/// Provider environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    #[default]
    Sandbox,
    Live,
}

impl ProviderMode {
    pub fn is_live(&self) -> bool {
        *self == ProviderMode::Live
    }
}

/// Payment configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Seconds an intent may stay `created` before it is treated as expired
    #[serde(default = "default_intent_ttl")]
    pub intent_ttl_secs: u64,

    pub card: Option<CardProviderConfig>,
    pub wallet: Option<WalletProviderConfig>,
    pub crypto: Option<CryptoProviderConfig>,
    pub regional: Option<RegionalProviderConfig>,
    pub bank_transfer: Option<BankTransferConfig>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            intent_ttl_secs: default_intent_ttl(),
            card: None,
            wallet: None,
            crypto: None,
            regional: None,
            bank_transfer: None,
        }
    }
}

impl PaymentConfig {
    /// Providers with a configuration section
    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.is_configured(*kind))
            .collect()
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Card => self.card.is_some(),
            ProviderKind::Wallet => self.wallet.is_some(),
            ProviderKind::Crypto => self.crypto.is_some(),
            ProviderKind::Regional => self.regional.is_some(),
            ProviderKind::BankTransfer => self.bank_transfer.is_some(),
        }
    }

    /// Signing secret for a provider's callbacks, if it receives any
    pub fn webhook_secret(&self, kind: ProviderKind) -> Option<&Secret<String>> {
        match kind {
            ProviderKind::Card => self.card.as_ref().map(|c| &c.webhook_secret),
            ProviderKind::Wallet => self.wallet.as_ref().map(|c| &c.webhook_secret),
            ProviderKind::Crypto => self.crypto.as_ref().map(|c| &c.webhook_secret),
            ProviderKind::Regional => self.regional.as_ref().map(|c| &c.webhook_secret),
            ProviderKind::BankTransfer => self
                .bank_transfer
                .as_ref()
                .and_then(|c| c.webhook_secret.as_ref()),
        }
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(60..=604_800).contains(&self.intent_ttl_secs) {
            return Err(ValidationError::InvalidIntentTtl);
        }
        if self.configured_providers().is_empty() {
            return Err(ValidationError::NoProviderConfigured);
        }
        if let Some(card) = &self.card {
            card.validate()?;
        }
        if let Some(wallet) = &self.wallet {
            wallet.validate()?;
        }
        if let Some(crypto) = &self.crypto {
            crypto.validate()?;
        }
        if let Some(regional) = &self.regional {
            regional.validate()?;
        }
        if let Some(bank) = &self.bank_transfer {
            bank.validate()?;
        }
        Ok(())
    }
}

fn require_secret(secret: &Secret<String>, name: &'static str) -> Result<(), ValidationError> {
    if secret.expose_secret().trim().is_empty() {
        return Err(ValidationError::MissingRequired(name));
    }
    Ok(())
}

fn require_http_url(url: &str, name: &'static str) -> Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl(name))
    }
}

/// Card processor (Stripe API)
#[derive(Debug, Clone, Deserialize)]
pub struct CardProviderConfig {
    #[serde(default)]
    pub mode: ProviderMode,

    /// Secret API key (`sk_test_...` / `sk_live_...`)
    pub secret_key: Secret<String>,

    /// Webhook signing secret (`whsec_...`)
    pub webhook_secret: Secret<String>,

    #[serde(default = "default_card_api_base_url")]
    pub api_base_url: String,
}

impl CardProviderConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_secret(&self.secret_key, "payment.card.secret_key")?;
        require_secret(&self.webhook_secret, "payment.card.webhook_secret")?;

        let key = self.secret_key.expose_secret();
        if !key.starts_with("sk_") {
            return Err(ValidationError::InvalidKeyFormat("payment.card.secret_key"));
        }
        if self.mode.is_live() && !key.starts_with("sk_live_") {
            return Err(ValidationError::LiveModeRequiresLiveKey("card"));
        }
        if !self.webhook_secret.expose_secret().starts_with("whsec_") {
            return Err(ValidationError::InvalidKeyFormat(
                "payment.card.webhook_secret",
            ));
        }
        require_http_url(&self.api_base_url, "payment.card.api_base_url")
    }
}

/// Wallet processor (PayPal REST API)
#[derive(Debug, Clone, Deserialize)]
pub struct WalletProviderConfig {
    #[serde(default)]
    pub mode: ProviderMode,

    pub client_id: String,
    pub client_secret: Secret<String>,
    pub webhook_secret: Secret<String>,

    /// Overrides the mode's default API host
    pub api_base_url: Option<String>,
}

impl WalletProviderConfig {
    pub fn api_base_url(&self) -> &str {
        match (&self.api_base_url, self.mode) {
            (Some(url), _) => url.as_str(),
            (None, ProviderMode::Sandbox) => "https://api-m.sandbox.paypal.com",
            (None, ProviderMode::Live) => "https://api-m.paypal.com",
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.client_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("payment.wallet.client_id"));
        }
        require_secret(&self.client_secret, "payment.wallet.client_secret")?;
        require_secret(&self.webhook_secret, "payment.wallet.webhook_secret")?;
        require_http_url(self.api_base_url(), "payment.wallet.api_base_url")
    }
}

/// Crypto processor (CoinGate API)
#[derive(Debug, Clone, Deserialize)]
pub struct CryptoProviderConfig {
    #[serde(default)]
    pub mode: ProviderMode,

    pub api_token: Secret<String>,
    pub webhook_secret: Secret<String>,

    /// Settlement currency requested from the processor
    #[serde(default = "default_receive_currency")]
    pub receive_currency: String,

    pub api_base_url: Option<String>,
}

impl CryptoProviderConfig {
    pub fn api_base_url(&self) -> &str {
        match (&self.api_base_url, self.mode) {
            (Some(url), _) => url.as_str(),
            (None, ProviderMode::Sandbox) => "https://api-sandbox.coingate.com",
            (None, ProviderMode::Live) => "https://api.coingate.com",
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_secret(&self.api_token, "payment.crypto.api_token")?;
        require_secret(&self.webhook_secret, "payment.crypto.webhook_secret")?;
        require_http_url(self.api_base_url(), "payment.crypto.api_base_url")
    }
}

/// Country-specific methods (Midtrans, Razorpay, hosted wallets, PIX)
#[derive(Debug, Clone, Deserialize)]
pub struct RegionalProviderConfig {
    #[serde(default)]
    pub mode: ProviderMode,

    pub webhook_secret: Secret<String>,

    pub midtrans_server_key: Option<Secret<String>>,
    pub midtrans_api_base_url: Option<String>,

    pub razorpay_key_id: Option<String>,
    pub razorpay_key_secret: Option<Secret<String>>,
    #[serde(default = "default_razorpay_api_base_url")]
    pub razorpay_api_base_url: String,

    /// Hosted checkout for Indonesian e-wallets (GoPay, OVO, DANA)
    #[serde(default = "default_id_wallet_gateway")]
    pub id_wallet_gateway_url: String,

    /// Hosted checkout for Philippine e-wallets (GCash, PayMaya)
    #[serde(default = "default_ph_wallet_gateway")]
    pub ph_wallet_gateway_url: String,

    /// PIX key receiving Brazilian instant payments
    pub pix_key: Option<String>,

    #[serde(default = "default_merchant_name")]
    pub merchant_name: String,
}

impl RegionalProviderConfig {
    pub fn midtrans_api_base_url(&self) -> &str {
        match (&self.midtrans_api_base_url, self.mode) {
            (Some(url), _) => url.as_str(),
            (None, ProviderMode::Sandbox) => "https://app.sandbox.midtrans.com",
            (None, ProviderMode::Live) => "https://app.midtrans.com",
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_secret(&self.webhook_secret, "payment.regional.webhook_secret")?;
        if self.razorpay_key_id.is_some() != self.razorpay_key_secret.is_some() {
            return Err(ValidationError::MissingRequired(
                "payment.regional.razorpay_key_secret",
            ));
        }
        if let (Some(id), true) = (&self.razorpay_key_id, self.mode.is_live()) {
            if !id.starts_with("rzp_live_") {
                return Err(ValidationError::LiveModeRequiresLiveKey("razorpay"));
            }
        }
        require_http_url(self.midtrans_api_base_url(), "payment.regional.midtrans_api_base_url")?;
        require_http_url(&self.razorpay_api_base_url, "payment.regional.razorpay_api_base_url")?;
        require_http_url(&self.id_wallet_gateway_url, "payment.regional.id_wallet_gateway_url")?;
        require_http_url(&self.ph_wallet_gateway_url, "payment.regional.ph_wallet_gateway_url")
    }
}

/// Receiving account shown in bank transfer instructions
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BankAccount {
    pub bank_name: String,
    pub account_number: String,
    pub routing_number: Option<String>,
    pub sort_code: Option<String>,
    pub swift_code: String,
}

/// Manual bank transfer
#[derive(Debug, Clone, Deserialize)]
pub struct BankTransferConfig {
    #[serde(default = "default_merchant_name")]
    pub beneficiary: String,

    /// Receiving accounts keyed by country code (`US`, `GB`, `EU`, ...)
    #[serde(default = "default_bank_accounts")]
    pub accounts: HashMap<String, BankAccount>,

    /// Only needed if a reconciliation system posts signed notifications
    pub webhook_secret: Option<Secret<String>>,
}

impl BankTransferConfig {
    /// Account for a country, falling back to `US`.
    pub fn account_for(&self, country: Option<&str>) -> Option<&BankAccount> {
        let find = |code: &str| {
            self.accounts
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(code))
                .map(|(_, account)| account)
        };
        country.and_then(find).or_else(|| find("US"))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.account_for(None).is_none() {
            return Err(ValidationError::MissingRequired(
                "payment.bank_transfer.accounts.US",
            ));
        }
        Ok(())
    }
}

impl Default for BankTransferConfig {
    fn default() -> Self {
        Self {
            beneficiary: default_merchant_name(),
            accounts: default_bank_accounts(),
            webhook_secret: None,
        }
    }
}

fn default_intent_ttl() -> u64 {
    3600
}

fn default_card_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_receive_currency() -> String {
    "USD".to_string()
}

fn default_razorpay_api_base_url() -> String {
    "https://api.razorpay.com".to_string()
}

fn default_id_wallet_gateway() -> String {
    "https://payment-gateway.id".to_string()
}

fn default_ph_wallet_gateway() -> String {
    "https://payment-gateway.ph".to_string()
}

fn default_merchant_name() -> String {
    "ARIBUY LLC".to_string()
}

fn default_bank_accounts() -> HashMap<String, BankAccount> {
    let mut accounts = HashMap::new();
    accounts.insert(
        "US".to_string(),
        BankAccount {
            bank_name: "Chase Bank".to_string(),
            account_number: "1234567890".to_string(),
            routing_number: Some("021000021".to_string()),
            sort_code: None,
            swift_code: "CHASUS33".to_string(),
        },
    );
    accounts.insert(
        "GB".to_string(),
        BankAccount {
            bank_name: "HSBC UK".to_string(),
            account_number: "12345678".to_string(),
            routing_number: None,
            sort_code: Some("40-02-02".to_string()),
            swift_code: "HBUKGB4B".to_string(),
        },
    );
    accounts.insert(
        "EU".to_string(),
        BankAccount {
            bank_name: "Deutsche Bank".to_string(),
            account_number: "DE89370400440532013000".to_string(),
            routing_number: None,
            sort_code: None,
            swift_code: "DEUTDEFF".to_string(),
        },
    );
    accounts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> Secret<String> {
        Secret::new(s.to_string())
    }

    fn card(mode: ProviderMode, key: &str) -> CardProviderConfig {
        CardProviderConfig {
            mode,
            secret_key: secret(key),
            webhook_secret: secret("whsec_xyz789"),
            api_base_url: default_card_api_base_url(),
        }
    }

    #[test]
    fn test_no_provider_is_invalid() {
        assert_eq!(
            PaymentConfig::default().validate(),
            Err(ValidationError::NoProviderConfigured)
        );
    }

    #[test]
    fn test_card_only_is_valid() {
        let config = PaymentConfig {
            card: Some(card(ProviderMode::Sandbox, "sk_test_abcd1234")),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.configured_providers(), vec![ProviderKind::Card]);
    }

    #[test]
    fn test_card_key_prefix_is_checked() {
        assert_eq!(
            card(ProviderMode::Sandbox, "pk_test_xxx").validate(),
            Err(ValidationError::InvalidKeyFormat("payment.card.secret_key"))
        );
    }

    #[test]
    fn test_live_mode_requires_live_key() {
        assert_eq!(
            card(ProviderMode::Live, "sk_test_xxx").validate(),
            Err(ValidationError::LiveModeRequiresLiveKey("card"))
        );
        assert!(card(ProviderMode::Live, "sk_live_xxx").validate().is_ok());
    }

    #[test]
    fn test_card_webhook_secret_prefix_is_checked() {
        let mut config = card(ProviderMode::Sandbox, "sk_test_xxx");
        config.webhook_secret = secret("secret_xxx");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_intent_ttl_bounds() {
        let config = PaymentConfig {
            intent_ttl_secs: 10,
            card: Some(card(ProviderMode::Sandbox, "sk_test_xxx")),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidIntentTtl));
    }

    #[test]
    fn test_wallet_api_host_follows_mode() {
        let mut wallet = WalletProviderConfig {
            mode: ProviderMode::Sandbox,
            client_id: "client".to_string(),
            client_secret: secret("s3cret"),
            webhook_secret: secret("hook"),
            api_base_url: None,
        };
        assert_eq!(wallet.api_base_url(), "https://api-m.sandbox.paypal.com");

        wallet.mode = ProviderMode::Live;
        assert_eq!(wallet.api_base_url(), "https://api-m.paypal.com");

        wallet.api_base_url = Some("http://localhost:9000".to_string());
        assert_eq!(wallet.api_base_url(), "http://localhost:9000");
    }

    #[test]
    fn test_bank_account_falls_back_to_us() {
        let bank = BankTransferConfig::default();

        assert_eq!(bank.account_for(Some("GB")).unwrap().bank_name, "HSBC UK");
        assert_eq!(bank.account_for(Some("gb")).unwrap().bank_name, "HSBC UK");
        assert_eq!(bank.account_for(Some("JP")).unwrap().bank_name, "Chase Bank");
        assert_eq!(bank.account_for(None).unwrap().swift_code, "CHASUS33");
        assert!(bank.validate().is_ok());
    }

    #[test]
    fn test_bank_transfer_has_no_secret_by_default() {
        let config = PaymentConfig {
            bank_transfer: Some(BankTransferConfig::default()),
            ..Default::default()
        };
        assert!(config.webhook_secret(ProviderKind::BankTransfer).is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_razorpay_key_pair_must_be_complete() {
        let regional = RegionalProviderConfig {
            mode: ProviderMode::Sandbox,
            webhook_secret: secret("hook"),
            midtrans_server_key: None,
            midtrans_api_base_url: None,
            razorpay_key_id: Some("rzp_test_1".to_string()),
            razorpay_key_secret: None,
            razorpay_api_base_url: default_razorpay_api_base_url(),
            id_wallet_gateway_url: default_id_wallet_gateway(),
            ph_wallet_gateway_url: default_ph_wallet_gateway(),
            pix_key: None,
            merchant_name: default_merchant_name(),
        };
        assert!(regional.validate().is_err());
    }
}
