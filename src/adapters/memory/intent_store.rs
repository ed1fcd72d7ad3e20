//! In-memory IntentStore.
//!
//! All maps sit behind one lock so that insert-if-absent and the secondary
//! indexes stay consistent. Suitable for tests and single-node development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{IdempotencyKey, IntentId, Timestamp};
use crate::domain::payment::{IntentStatus, PaymentIntent, ProviderKind};
use crate::ports::{check_status_progression, InsertResult, IntentStore, IntentStoreError};

#[derive(Debug, Default)]
struct Inner {
    intents: HashMap<IntentId, PaymentIntent>,
    by_key: HashMap<String, IntentId>,
    by_external: HashMap<(ProviderKind, String), IntentId>,
}

impl Inner {
    fn index(&mut self, intent: &PaymentIntent) {
        self.by_key
            .insert(intent.idempotency_key.as_str().to_string(), intent.id);
        if let Some(external_id) = &intent.external_id {
            self.by_external
                .insert((intent.provider, external_id.clone()), intent.id);
        }
    }
}

/// In-memory intent storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIntentStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryIntentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored intents.
    pub async fn len(&self) -> usize {
        self.inner.read().await.intents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl IntentStore for InMemoryIntentStore {
    async fn get_by_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<PaymentIntent>, IntentStoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_key
            .get(key.as_str())
            .and_then(|id| inner.intents.get(id))
            .cloned())
    }

    async fn get_by_id(&self, id: &IntentId) -> Result<Option<PaymentIntent>, IntentStoreError> {
        Ok(self.inner.read().await.intents.get(id).cloned())
    }

    async fn get_by_external_id(
        &self,
        provider: ProviderKind,
        external_id: &str,
    ) -> Result<Option<PaymentIntent>, IntentStoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_external
            .get(&(provider, external_id.to_string()))
            .and_then(|id| inner.intents.get(id))
            .cloned())
    }

    async fn insert_new(&self, intent: &PaymentIntent) -> Result<InsertResult, IntentStoreError> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .by_key
            .get(intent.idempotency_key.as_str())
            .and_then(|id| inner.intents.get(id))
        {
            return Ok(InsertResult::AlreadyExists(existing.clone()));
        }

        inner.index(intent);
        inner.intents.insert(intent.id, intent.clone());
        Ok(InsertResult::Inserted)
    }

    async fn put(&self, intent: &PaymentIntent) -> Result<(), IntentStoreError> {
        let mut inner = self.inner.write().await;

        if let Some(holder) = inner.by_key.get(intent.idempotency_key.as_str()) {
            if *holder != intent.id {
                return Err(IntentStoreError::KeyConflict(
                    intent.idempotency_key.to_string(),
                ));
            }
        }
        if let Some(current) = inner.intents.get(&intent.id) {
            check_status_progression(current.status, intent.status)?;
        }

        inner.index(intent);
        inner.intents.insert(intent.id, intent.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: &IntentId,
        status: IntentStatus,
    ) -> Result<PaymentIntent, IntentStoreError> {
        let mut inner = self.inner.write().await;
        let intent = inner
            .intents
            .get_mut(id)
            .ok_or(IntentStoreError::NotFound(*id))?;
        intent.transition_to(status, Timestamp::now())?;
        Ok(intent.clone())
    }
}
