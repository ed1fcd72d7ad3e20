//! Bounded, time-windowed memory of recently processed event ids.
//!
//! Catches exact redeliveries without a storage round-trip. The durable
//! processed-event store remains the source of truth; this cache may forget.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::domain::payment::ProviderKind;

type EventKey = (ProviderKind, String);

#[derive(Debug, Default)]
struct Inner {
    seen: HashMap<EventKey, Instant>,
    order: VecDeque<(EventKey, Instant)>,
}

#[derive(Debug)]
pub struct RecentEventCache {
    capacity: usize,
    window: Duration,
    inner: Mutex<Inner>,
}

impl RecentEventCache {
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            capacity,
            window,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// True if the event was remembered within the window.
    pub fn contains(&self, provider: ProviderKind, event_id: &str) -> bool {
        let now = Instant::now();
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.evict(&mut inner, now);
        inner
            .seen
            .get(&(provider, event_id.to_string()))
            .map(|at| now.duration_since(*at) < self.window)
            .unwrap_or(false)
    }

    /// Remembers an event id, evicting the oldest entries when full.
    pub fn remember(&self, provider: ProviderKind, event_id: &str) {
        if self.capacity == 0 {
            return;
        }
        let now = Instant::now();
        let key = (provider, event_id.to_string());
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.evict(&mut inner, now);

        if inner.seen.insert(key.clone(), now).is_none() {
            inner.order.push_back((key, now));
        }
        while inner.seen.len() > self.capacity {
            match inner.order.pop_front() {
                Some((oldest, _)) => {
                    inner.seen.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(guard) => guard.seen.len(),
            Err(poisoned) => poisoned.into_inner().seen.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict(&self, inner: &mut Inner, now: Instant) {
        while let Some((_, at)) = inner.order.front() {
            if now.duration_since(*at) < self.window {
                break;
            }
            if let Some((key, _)) = inner.order.pop_front() {
                inner.seen.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_within_window() {
        let cache = RecentEventCache::new(10, Duration::from_secs(60));
        cache.remember(ProviderKind::Card, "evt_1");

        assert!(cache.contains(ProviderKind::Card, "evt_1"));
        assert!(!cache.contains(ProviderKind::Card, "evt_2"));
    }

    #[test]
    fn event_ids_are_scoped_per_provider() {
        let cache = RecentEventCache::new(10, Duration::from_secs(60));
        cache.remember(ProviderKind::Card, "evt_1");

        assert!(!cache.contains(ProviderKind::Wallet, "evt_1"));
    }

    #[test]
    fn forgets_after_window() {
        let cache = RecentEventCache::new(10, Duration::ZERO);
        cache.remember(ProviderKind::Card, "evt_1");

        assert!(!cache.contains(ProviderKind::Card, "evt_1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn evicts_oldest_when_full() {
        let cache = RecentEventCache::new(2, Duration::from_secs(60));
        cache.remember(ProviderKind::Card, "evt_1");
        cache.remember(ProviderKind::Card, "evt_2");
        cache.remember(ProviderKind::Card, "evt_3");

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(ProviderKind::Card, "evt_1"));
        assert!(cache.contains(ProviderKind::Card, "evt_3"));
    }

    #[test]
    fn remembering_twice_keeps_one_entry() {
        let cache = RecentEventCache::new(10, Duration::from_secs(60));
        cache.remember(ProviderKind::Crypto, "evt_1");
        cache.remember(ProviderKind::Crypto, "evt_1");

        assert_eq!(cache.len(), 1);
    }
}
