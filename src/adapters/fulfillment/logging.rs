//! Fulfillment hook that only records the event.
//!
//! Stands in until a storefront wires real fulfillment (downloads,
//! license emails) behind [`FulfillmentHook`].

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::payment::PaymentIntent;
use crate::ports::FulfillmentHook;

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingFulfillment;

#[async_trait]
impl FulfillmentHook for LoggingFulfillment {
    async fn on_payment_succeeded(&self, intent: &PaymentIntent) -> Result<(), DomainError> {
        tracing::info!(
            intent_id = %intent.id,
            provider = %intent.provider,
            amount_minor_units = intent.amount_minor_units,
            currency = %intent.currency,
            "order ready for fulfillment"
        );
        Ok(())
    }
}
