//! Per-intent async locks.
//!
//! Every read-modify-write of one intent (provider response, webhook,
//! expiry) runs under that intent's lock; different intents never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::IntentId;

/// Idle locks are dropped once the table grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct IntentLocks {
    locks: DashMap<IntentId, Arc<Mutex<()>>>,
}

impl IntentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `id`.
    pub async fn lock(&self, id: IntentId) -> OwnedMutexGuard<()> {
        if self.locks.len() > PRUNE_THRESHOLD {
            self.prune();
        }
        let mutex = self.locks.entry(id).or_default().clone();
        mutex.lock_owned().await
    }

    /// Drops locks nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_intent_is_serialized() {
        let locks = Arc::new(IntentLocks::new());
        let id = IntentId::new();
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let (locks, active, max_active) = (locks.clone(), active.clone(), max_active.clone());
                tokio::spawn(async move {
                    let _guard = locks.lock(id).await;
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    max_active.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        futures::future::join_all(tasks).await;

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_intents_do_not_block() {
        let locks = IntentLocks::new();
        let _first = locks.lock(IntentId::new()).await;

        let second = tokio::time::timeout(Duration::from_millis(100), locks.lock(IntentId::new())).await;

        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn prune_keeps_held_locks() {
        let locks = IntentLocks::new();
        let held = locks.lock(IntentId::new()).await;
        drop(locks.lock(IntentId::new()).await);

        locks.prune();

        assert_eq!(locks.len(), 1);
        drop(held);
    }
}
