//! IntentStore port - durable idempotency key → payment intent mapping.
//!
//! The store is the single source of truth for whether a checkout has
//! already been attempted. Implementations must make `insert_new` atomic on
//! the idempotency key (unique constraint or equivalent) so that concurrent
//! submissions with one key produce exactly one intent.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{IdempotencyKey, IntentId, StateMachine, TransitionError};
use crate::domain::payment::{IntentStatus, PaymentError, PaymentIntent, ProviderKind};
use crate::domain::webhook::WebhookError;

/// Result of attempting to insert a new intent.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertResult {
    /// Intent was stored; the caller owns the provider call.
    Inserted,
    /// Another intent already holds the key; it is returned unchanged.
    AlreadyExists(PaymentIntent),
}

#[derive(Debug, Error)]
pub enum IntentStoreError {
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("Payment intent {0} not found")]
    NotFound(IntentId),

    #[error("Idempotency key '{0}' belongs to another intent")]
    KeyConflict(String),

    #[error("Intent storage failed: {0}")]
    Backend(String),
}

/// Port for persisting payment intents.
#[async_trait]
pub trait IntentStore: Send + Sync {
    /// Find the intent created for an idempotency key.
    async fn get_by_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<PaymentIntent>, IntentStoreError>;

    /// Find an intent by id.
    async fn get_by_id(&self, id: &IntentId) -> Result<Option<PaymentIntent>, IntentStoreError>;

    /// Find the intent a provider reference belongs to.
    async fn get_by_external_id(
        &self,
        provider: ProviderKind,
        external_id: &str,
    ) -> Result<Option<PaymentIntent>, IntentStoreError>;

    /// Atomically insert unless the idempotency key is taken.
    async fn insert_new(&self, intent: &PaymentIntent) -> Result<InsertResult, IntentStoreError>;

    /// Upsert by id.
    ///
    /// Rejects a status that does not follow from the stored one, and a key
    /// already held by a different intent.
    async fn put(&self, intent: &PaymentIntent) -> Result<(), IntentStoreError>;

    /// Move the stored intent to `status`, validated by the state machine.
    async fn update_status(
        &self,
        id: &IntentId,
        status: IntentStatus,
    ) -> Result<PaymentIntent, IntentStoreError>;
}

/// Checks that `next` may replace `current` in storage.
///
/// Equal statuses are allowed so field-only updates can be written.
pub fn check_status_progression(
    current: IntentStatus,
    next: IntentStatus,
) -> Result<(), TransitionError> {
    if current == next {
        return Ok(());
    }
    current.transition_to(next).map(|_| ())
}

impl From<IntentStoreError> for PaymentError {
    fn from(err: IntentStoreError) -> Self {
        match err {
            IntentStoreError::InvalidTransition(inner) => PaymentError::InvalidTransition(inner),
            IntentStoreError::NotFound(id) => PaymentError::NotFound(id),
            other => PaymentError::Storage(other.to_string()),
        }
    }
}

impl From<IntentStoreError> for WebhookError {
    fn from(err: IntentStoreError) -> Self {
        match err {
            IntentStoreError::InvalidTransition(inner) => {
                WebhookError::InvalidTransition(inner.to_string())
            }
            other => WebhookError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_status_is_allowed() {
        assert!(check_status_progression(IntentStatus::Pending, IntentStatus::Pending).is_ok());
    }

    #[test]
    fn regression_is_rejected() {
        assert!(
            check_status_progression(IntentStatus::Succeeded, IntentStatus::Pending).is_err()
        );
        assert!(check_status_progression(IntentStatus::Pending, IntentStatus::Created).is_err());
    }

    #[test]
    fn forward_move_is_allowed() {
        assert!(check_status_progression(IntentStatus::Created, IntentStatus::Expired).is_ok());
    }

    #[test]
    fn store_errors_map_to_payment_errors() {
        let id = IntentId::new();
        assert!(matches!(
            PaymentError::from(IntentStoreError::NotFound(id)),
            PaymentError::NotFound(found) if found == id
        ));
        assert!(matches!(
            PaymentError::from(IntentStoreError::Backend("down".into())),
            PaymentError::Storage(_)
        ));
    }

    #[test]
    fn store_errors_map_to_retryable_webhook_errors() {
        let err = WebhookError::from(IntentStoreError::Backend("down".into()));
        assert!(err.is_retryable());
    }
}
