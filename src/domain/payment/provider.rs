//! Payment provider kinds and regional payment methods.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The processor families a checkout can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Card processor (Stripe-style payment intents).
    Card,

    /// Wallet processor (PayPal-style orders).
    Wallet,

    /// Crypto processor (CoinGate-style orders).
    Crypto,

    /// Country-specific methods, see [`RegionalMethod`].
    Regional,

    /// Manual bank transfer, verified out of band.
    BankTransfer,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Card,
        ProviderKind::Wallet,
        ProviderKind::Crypto,
        ProviderKind::Regional,
        ProviderKind::BankTransfer,
    ];

    /// Stable lower-case name used in storage, URLs and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Card => "card",
            ProviderKind::Wallet => "wallet",
            ProviderKind::Crypto => "crypto",
            ProviderKind::Regional => "regional",
            ProviderKind::BankTransfer => "bank_transfer",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    /// Accepts the canonical names plus the storefront's processor aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "card" | "stripe" => Ok(ProviderKind::Card),
            "wallet" | "paypal" => Ok(ProviderKind::Wallet),
            "crypto" | "coingate" => Ok(ProviderKind::Crypto),
            "regional" => Ok(ProviderKind::Regional),
            "bank_transfer" | "bank-transfer" | "bank" => Ok(ProviderKind::BankTransfer),
            other => Err(format!("unknown payment provider '{}'", other)),
        }
    }
}

/// Country-specific payment methods offered through the regional provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionalMethod {
    Midtrans,
    GoPay,
    Ovo,
    Dana,
    Fpx,
    GrabPay,
    PayNow,
    PromptPay,
    TrueMoney,
    Momo,
    ZaloPay,
    GCash,
    PayMaya,
    Upi,
    Paytm,
    Razorpay,
    Pix,
    Boleto,
    Oxxo,
    Spei,
    Alipay,
    WeChatPay,
}

/// How a regional method is integrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionalIntegration {
    /// Midtrans Snap transaction.
    MidtransSnap,
    /// Razorpay order.
    RazorpayOrder,
    /// Hosted e-wallet gateway page.
    HostedWallet,
    /// Brazilian instant payment code.
    PixCode,
    /// Listed for the country but not wired to a gateway.
    Unavailable,
}

impl RegionalMethod {
    /// Lower-case identifier, matches the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionalMethod::Midtrans => "midtrans",
            RegionalMethod::GoPay => "gopay",
            RegionalMethod::Ovo => "ovo",
            RegionalMethod::Dana => "dana",
            RegionalMethod::Fpx => "fpx",
            RegionalMethod::GrabPay => "grabpay",
            RegionalMethod::PayNow => "paynow",
            RegionalMethod::PromptPay => "promptpay",
            RegionalMethod::TrueMoney => "truemoney",
            RegionalMethod::Momo => "momo",
            RegionalMethod::ZaloPay => "zalopay",
            RegionalMethod::GCash => "gcash",
            RegionalMethod::PayMaya => "paymaya",
            RegionalMethod::Upi => "upi",
            RegionalMethod::Paytm => "paytm",
            RegionalMethod::Razorpay => "razorpay",
            RegionalMethod::Pix => "pix",
            RegionalMethod::Boleto => "boleto",
            RegionalMethod::Oxxo => "oxxo",
            RegionalMethod::Spei => "spei",
            RegionalMethod::Alipay => "alipay",
            RegionalMethod::WeChatPay => "wechatpay",
        }
    }

    /// Human-readable label shown at checkout.
    pub fn display_name(&self) -> &'static str {
        match self {
            RegionalMethod::Midtrans => "Midtrans",
            RegionalMethod::GoPay => "GoPay",
            RegionalMethod::Ovo => "OVO",
            RegionalMethod::Dana => "DANA",
            RegionalMethod::Fpx => "FPX",
            RegionalMethod::GrabPay => "GrabPay",
            RegionalMethod::PayNow => "PayNow",
            RegionalMethod::PromptPay => "PromptPay",
            RegionalMethod::TrueMoney => "TrueMoney",
            RegionalMethod::Momo => "MoMo",
            RegionalMethod::ZaloPay => "ZaloPay",
            RegionalMethod::GCash => "GCash",
            RegionalMethod::PayMaya => "PayMaya",
            RegionalMethod::Upi => "UPI",
            RegionalMethod::Paytm => "Paytm",
            RegionalMethod::Razorpay => "Razorpay",
            RegionalMethod::Pix => "PIX",
            RegionalMethod::Boleto => "Boleto",
            RegionalMethod::Oxxo => "OXXO",
            RegionalMethod::Spei => "SPEI",
            RegionalMethod::Alipay => "Alipay",
            RegionalMethod::WeChatPay => "WeChat Pay",
        }
    }

    pub fn integration(&self) -> RegionalIntegration {
        match self {
            RegionalMethod::Midtrans => RegionalIntegration::MidtransSnap,
            RegionalMethod::Razorpay => RegionalIntegration::RazorpayOrder,
            RegionalMethod::GoPay
            | RegionalMethod::Ovo
            | RegionalMethod::Dana
            | RegionalMethod::GCash
            | RegionalMethod::PayMaya => RegionalIntegration::HostedWallet,
            RegionalMethod::Pix => RegionalIntegration::PixCode,
            _ => RegionalIntegration::Unavailable,
        }
    }

    pub fn is_integrated(&self) -> bool {
        self.integration() != RegionalIntegration::Unavailable
    }
}

impl fmt::Display for RegionalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionalMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.trim().to_ascii_lowercase()))
            .map_err(|_| format!("unknown regional payment method '{}'", s))
    }
}
