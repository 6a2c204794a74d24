// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-key async mutexes for serialized counter arithmetic
//!
//! Locks are created on demand and held through weak references, so a key
//! with no holders costs nothing but a map slot; dead slots are swept
//! opportunistically once the map grows.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::OwnedMutexGuard;

const SWEEP_THRESHOLD: usize = 1024;

/// A map of reference-counted per-key `tokio::sync::Mutex`es.
#[derive(Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Weak<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the mutex for `key`, creating it on first use. The guard is
    /// owned, so it can be held across awaits.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut inner = self.inner.lock();
            if inner.len() > SWEEP_THRESHOLD {
                inner.retain(|_, weak| weak.strong_count() > 0);
            }
            match inner.get(key).and_then(Weak::upgrade) {
                Some(existing) => existing,
                None => {
                    let fresh = Arc::new(tokio::sync::Mutex::new(()));
                    inner.insert(key.to_string(), Arc::downgrade(&fresh));
                    fresh
                }
            }
        };
        mutex.lock_owned().await
    }

    /// Number of live (currently held or reachable) lock slots.
    pub fn live_count(&self) -> usize {
        self.inner.lock().values().filter(|w| w.strong_count() > 0).count()
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
