//! Bounded TTL cache for analysis responses.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use serde_json::Value;

/// Response cache used by the analysis routes.
pub trait ResponseCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    /// Live entries, expired ones included until the next access purges them.
    fn len(&self) -> usize;
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Instant,
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    /// Recency order: lowest sequence number is the least recently used.
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl Inner {
    fn touch(&mut self, key: &str) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(entry) = self.entries.get_mut(key) {
            self.order.remove(&entry.seq);
            entry.seq = seq;
            self.order.insert(seq, key.to_string());
        }
    }

    fn remove(&mut self, key: &str) {
        if let Some(entry) = self.entries.remove(key) {
            self.order.remove(&entry.seq);
        }
    }

    fn purge_expired(&mut self, now: Instant) {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.expires_at <= now)
            .map(|(k, _)| k.clone())
            .collect();
        for key in expired {
            self.remove(&key);
        }
    }
}

/// Entries expire after `ttl`; past `max_items` the least recently used
/// entry is evicted. Reads refresh recency.
#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    max_items: usize,
    inner: Mutex<Inner>,
}

impl TtlCache {
    #[must_use]
    pub fn new(ttl: Duration, max_items: usize) -> Self {
        Self {
            ttl,
            max_items: max_items.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        let mut inner = self.lock();
        inner.purge_expired(now);
        let value = inner.entries.get(key).map(|e| e.value.clone())?;
        inner.touch(key);
        Some(value)
    }

    pub(crate) fn set_at(&self, key: &str, value: Value, now: Instant) {
        let mut inner = self.lock();
        inner.purge_expired(now);
        inner.remove(key);

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + self.ttl,
                seq,
            },
        );
        inner.order.insert(seq, key.to_string());

        while inner.entries.len() > self.max_items {
            let Some((_, oldest)) = inner.order.pop_first() else {
                break;
            };
            inner.entries.remove(&oldest);
        }
    }
}

impl ResponseCache for TtlCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    fn set(&self, key: &str, value: Value) {
        self.set_at(key, value, Instant::now());
    }

    fn len(&self) -> usize {
        self.lock().entries.len()
    }
}
