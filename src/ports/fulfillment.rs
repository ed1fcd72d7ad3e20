//! Fulfillment hook port.
//!
//! Invoked once when an intent first reaches `succeeded`. What fulfillment
//! means (granting a download, emailing a license) is outside this service.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payment::PaymentIntent;

#[async_trait]
pub trait FulfillmentHook: Send + Sync {
    /// Fulfill the order behind a succeeded intent.
    ///
    /// Errors are logged by the caller and never roll back the payment.
    async fn on_payment_succeeded(&self, intent: &PaymentIntent) -> Result<(), DomainError>;
}
