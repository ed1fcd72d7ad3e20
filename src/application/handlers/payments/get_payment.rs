//! GetPaymentHandler - Query handler for reading an intent.
//!
//! An intent left in `created` past its TTL is moved to `expired` on read.
//! Nothing sweeps intents in the background.

use std::sync::Arc;

use crate::application::IntentLocks;
use crate::domain::foundation::{IntentId, Timestamp, ValidationError};
use crate::domain::payment::{IntentStatus, PaymentError, PaymentIntent};
use crate::ports::IntentStore;

/// Query for a single intent.
#[derive(Debug, Clone)]
pub struct GetPaymentQuery {
    pub intent_id: String,
}

/// Handler for intent reads.
pub struct GetPaymentHandler {
    store: Arc<dyn IntentStore>,
    locks: Arc<IntentLocks>,
    intent_ttl_secs: u64,
}

impl GetPaymentHandler {
    pub fn new(store: Arc<dyn IntentStore>, locks: Arc<IntentLocks>, intent_ttl_secs: u64) -> Self {
        Self {
            store,
            locks,
            intent_ttl_secs,
        }
    }

    pub async fn handle(&self, query: GetPaymentQuery) -> Result<PaymentIntent, PaymentError> {
        let id: IntentId = query
            .intent_id
            .trim()
            .parse()
            .map_err(|_| ValidationError::invalid_format("id", "must be a UUID"))?;

        let intent = self
            .store
            .get_by_id(&id)
            .await?
            .ok_or(PaymentError::NotFound(id))?;

        expire_if_stale(self.store.as_ref(), &self.locks, intent, self.intent_ttl_secs).await
    }
}

/// Moves an intent left in `created` past its TTL to `expired`.
///
/// Shared by every path that hands a stored intent back to a client.
pub(crate) async fn expire_if_stale(
    store: &dyn IntentStore,
    locks: &IntentLocks,
    intent: PaymentIntent,
    ttl_secs: u64,
) -> Result<PaymentIntent, PaymentError> {
    let now = Timestamp::now();
    if !intent.is_logically_expired(ttl_secs, now) {
        return Ok(intent);
    }

    // Re-read under the lock; the provider call may have just landed.
    let id = intent.id;
    let _guard = locks.lock(id).await;
    let mut intent = store
        .get_by_id(&id)
        .await?
        .ok_or(PaymentError::NotFound(id))?;
    if intent.is_logically_expired(ttl_secs, now) {
        intent.transition_to(IntentStatus::Expired, now)?;
        store.put(&intent).await?;
        tracing::info!(intent_id = %intent.id, "payment intent expired");
    }
    Ok(intent)
}
