// src/cache.rs
//
// Process-wide snapshot cache for loaded tables, keyed by the source
// identity. Values are whole loaded tables, never derived aggregates.
// Writes are last-writer-wins; repeated loads of the same source are
// idempotent, so no stronger coordination is needed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

struct CacheEntry<T> {
    stored_at: Instant,
    value: Arc<T>,
}

/// TTL cache holding one table snapshot per source key.
pub struct TableCache<T> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T> TableCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached snapshot for `key`, or `None` when absent or
    /// older than the TTL. Stale entries are evicted on the way out.
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(Arc::clone(&entry.value)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores a fresh snapshot and hands back the shared handle.
    pub fn put(&self, key: &str, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.lock().insert(
            key.to_string(),
            CacheEntry {
                stored_at: Instant::now(),
                value: Arc::clone(&value),
            },
        );
        value
    }

    /// Drops the snapshot for one source.
    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Drops every snapshot.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
