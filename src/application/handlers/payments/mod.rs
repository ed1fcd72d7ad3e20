//! Payment handlers: checkout, polling, provider callbacks and method listing.

mod create_payment;
mod get_payment;
mod handle_webhook;
mod list_payment_methods;

pub use create_payment::{CreatePaymentCommand, CreatePaymentHandler, CreatePaymentResult};
pub use get_payment::{GetPaymentHandler, GetPaymentQuery};
pub(crate) use get_payment::expire_if_stale;
pub use handle_webhook::{HandleWebhookCommand, HandleWebhookHandler, HandleWebhookResult};
pub use list_payment_methods::{ListPaymentMethodsHandler, ListPaymentMethodsQuery};

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::foundation::{Currency, DomainError, IdempotencyKey, IntentId, Timestamp};
    use crate::domain::payment::{IntentDraft, PaymentIntent, ProviderKind};
    use crate::ports::FulfillmentHook;

    /// Card intent in `created`, as stored right after insert.
    pub fn created_intent(key: &str, created_at: Timestamp) -> PaymentIntent {
        PaymentIntent::create(
            IntentDraft {
                idempotency_key: IdempotencyKey::new(key).unwrap(),
                provider: ProviderKind::Card,
                method: None,
                country: None,
                amount_minor_units: 4700,
                currency: Currency::usd(),
                customer_email: "buyer@example.com".to_string(),
                metadata: BTreeMap::new(),
            },
            created_at,
        )
    }

    /// Fulfillment hook that remembers which intents it was called for.
    #[derive(Default)]
    pub struct RecordingFulfillment {
        calls: Mutex<Vec<IntentId>>,
    }

    impl RecordingFulfillment {
        pub fn succeeded(&self) -> Vec<IntentId> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FulfillmentHook for RecordingFulfillment {
        async fn on_payment_succeeded(&self, intent: &PaymentIntent) -> Result<(), DomainError> {
            self.calls.lock().unwrap().push(intent.id);
            Ok(())
        }
    }
}
