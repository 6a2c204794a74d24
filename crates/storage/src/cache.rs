// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-through read cache for scoped variables
//!
//! Size-bounded LRU with a per-entry TTL. The state manager refreshes an
//! entry only after the storage write commits, so the cache can never be
//! ahead of durable state.

use crate::adapter::StoredValue;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Default cache residency per entry.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Default entry capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

struct Entry {
    stored: StoredValue,
    inserted_at_ms: u64,
}

/// Thread-safe LRU + TTL cache keyed by canonical storage key.
pub struct StateCache {
    inner: Mutex<LruCache<String, Entry>>,
    ttl_ms: u64,
}

impl StateCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self { inner: Mutex::new(LruCache::new(capacity)), ttl_ms: ttl.as_millis() as u64 }
    }

    /// Cached entry, if still resident and not expired (either by cache
    /// TTL or by the stored value's own expiry).
    pub fn get(&self, key: &str, now_ms: u64) -> Option<StoredValue> {
        let mut inner = self.inner.lock();
        let entry = inner.get(key)?;
        if now_ms.saturating_sub(entry.inserted_at_ms) >= self.ttl_ms
            || entry.stored.is_expired(now_ms)
        {
            inner.pop(key);
            return None;
        }
        Some(entry.stored.clone())
    }

    /// Insert or refresh after a storage commit.
    pub fn put(&self, key: &str, stored: StoredValue, now_ms: u64) {
        self.inner
            .lock()
            .put(key.to_string(), Entry { stored, inserted_at_ms: now_ms });
    }

    pub fn invalidate(&self, key: &str) {
        self.inner.lock().pop(key);
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for StateCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
