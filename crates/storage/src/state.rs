// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scoped state manager
//!
//! Layers on a storage adapter: scope resolution, default materialization,
//! TTL enforcement, a write-through cache, and serialized arithmetic on
//! counters. Defaults appear only while no stored value exists; a stored
//! `0`, `""`, or `false` shadows the default, and deleting the stored
//! value restores default visibility.

use crate::adapter::{QueryOptions, Row, StorageAdapter, StoredValue};
use crate::cache::StateCache;
use crate::locks::KeyedLocks;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use weft_core::{parse_duration, Clock, ScopeContext, Value, WeftError};
use weft_spec::{StateSchema, VariableDef};

/// The runtime's state surface: scoped variables and declared tables.
pub struct StateManager<C: Clock> {
    storage: Arc<dyn StorageAdapter>,
    schema: StateSchema,
    cache: StateCache,
    locks: KeyedLocks,
    /// `persist: false` variables never touch the adapter.
    ephemeral: Mutex<HashMap<String, StoredValue>>,
    clock: C,
}

impl<C: Clock> StateManager<C> {
    pub fn new(storage: Arc<dyn StorageAdapter>, schema: StateSchema, clock: C) -> Self {
        Self {
            storage,
            schema,
            cache: StateCache::default(),
            locks: KeyedLocks::new(),
            ephemeral: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Override cache shape (tests use small capacities).
    pub fn with_cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache = StateCache::new(capacity, ttl);
        self
    }

    /// Create every declared table on the backend.
    pub async fn ensure_tables(&self) -> Result<(), WeftError> {
        for table in self.schema.tables.values() {
            self.storage.create_table(table).await?;
        }
        Ok(())
    }

    fn resolve(&self, name: &str) -> Result<&VariableDef, WeftError> {
        self.schema
            .variable(name)
            .ok_or_else(|| WeftError::validation(format!("unknown variable '{name}'")))
    }

    fn default_of(def: &VariableDef) -> Value {
        def.default.clone().map(Value::from_json).unwrap_or(Value::Null)
    }

    fn ttl_ms(def: &VariableDef) -> Option<u64> {
        let ttl = def.ttl.as_deref()?;
        // Unparseable TTLs fall back to no expiry
        parse_duration(ttl).map(|d| d.as_millis() as u64)
    }

    /// Current value, or the declared default when nothing is stored.
    pub async fn get(&self, name: &str, ctx: &ScopeContext) -> Result<Value, WeftError> {
        let def = self.resolve(name)?;
        let key = def.scope.storage_key(name, ctx)?;
        let now = self.clock.epoch_ms();

        if !def.persist {
            let ephemeral = self.ephemeral.lock();
            return Ok(match ephemeral.get(&key) {
                Some(stored) if !stored.is_expired(now) => stored.value.clone(),
                _ => Self::default_of(def),
            });
        }

        if let Some(hit) = self.cache.get(&key, now) {
            return Ok(hit.value);
        }
        match self.storage.get(&key).await? {
            Some(stored) => {
                self.cache.put(&key, stored.clone(), now);
                Ok(stored.value)
            }
            None => Ok(Self::default_of(def)),
        }
    }

    /// Whether a stored (non-default) value exists.
    pub async fn has(&self, name: &str, ctx: &ScopeContext) -> Result<bool, WeftError> {
        let def = self.resolve(name)?;
        let key = def.scope.storage_key(name, ctx)?;
        if !def.persist {
            let now = self.clock.epoch_ms();
            return Ok(self
                .ephemeral
                .lock()
                .get(&key)
                .is_some_and(|stored| !stored.is_expired(now)));
        }
        self.storage.has(&key).await
    }

    /// Write-through set: storage commits before the cache refreshes.
    pub async fn set(&self, name: &str, value: Value, ctx: &ScopeContext) -> Result<(), WeftError> {
        let def = self.resolve(name)?;
        let key = def.scope.storage_key(name, ctx)?;
        let now = self.clock.epoch_ms();
        let stored = StoredValue::new(value, now, Self::ttl_ms(def));

        if !def.persist {
            self.ephemeral.lock().insert(key, stored);
            return Ok(());
        }

        self.storage.set(&key, stored.clone()).await?;
        self.cache.put(&key, stored, now);
        Ok(())
    }

    /// Remove the stored value; the declared default becomes visible again.
    pub async fn delete(&self, name: &str, ctx: &ScopeContext) -> Result<bool, WeftError> {
        let def = self.resolve(name)?;
        let key = def.scope.storage_key(name, ctx)?;
        if !def.persist {
            return Ok(self.ephemeral.lock().remove(&key).is_some());
        }
        let existed = self.storage.delete(&key).await?;
        self.cache.invalidate(&key);
        Ok(existed)
    }

    /// Serialized numeric increment; returns the post-increment value.
    ///
    /// Under N concurrent calls the final value is the sum of all deltas
    /// and each call observes a distinct prefix sum.
    pub async fn increment(
        &self,
        name: &str,
        by: f64,
        ctx: &ScopeContext,
    ) -> Result<f64, WeftError> {
        let def = self.resolve(name)?;
        let key = def.scope.storage_key(name, ctx)?;
        let _guard = self.locks.lock(&key).await;
        let now = self.clock.epoch_ms();

        let previous = if def.persist {
            self.storage.get(&key).await?
        } else {
            let ephemeral = self.ephemeral.lock();
            ephemeral.get(&key).filter(|s| !s.is_expired(now)).cloned()
        };

        let current = match &previous {
            Some(stored) => stored.value.coerce_number(),
            None => Self::default_of(def).coerce_number(),
        };
        let current = if current.is_nan() { 0.0 } else { current };
        let next = current + by;

        let stored = match previous {
            Some(existing) => existing.updated(Value::Number(next), now, Self::ttl_ms(def)),
            None => StoredValue::new(Value::Number(next), now, Self::ttl_ms(def)),
        };

        if def.persist {
            self.storage.set(&key, stored.clone()).await?;
            self.cache.put(&key, stored, now);
        } else {
            self.ephemeral.lock().insert(key, stored);
        }
        Ok(next)
    }

    pub async fn decrement(
        &self,
        name: &str,
        by: f64,
        ctx: &ScopeContext,
    ) -> Result<f64, WeftError> {
        self.increment(name, -by, ctx).await
    }

    /// Append to an array variable (created as a one-element array when
    /// absent). Serialized per key like the counters.
    pub async fn list_push(
        &self,
        name: &str,
        value: Value,
        ctx: &ScopeContext,
    ) -> Result<usize, WeftError> {
        self.mutate_list(name, ctx, |items| {
            items.push(value.clone());
            items.len()
        })
        .await
    }

    /// Remove the first loosely-equal element; returns whether one was
    /// removed.
    pub async fn list_remove(
        &self,
        name: &str,
        value: Value,
        ctx: &ScopeContext,
    ) -> Result<bool, WeftError> {
        self.mutate_list(name, ctx, |items| {
            match items.iter().position(|v| v.loose_eq(&value)) {
                Some(i) => {
                    items.remove(i);
                    true
                }
                None => false,
            }
        })
        .await
    }

    async fn mutate_list<T>(
        &self,
        name: &str,
        ctx: &ScopeContext,
        mutate: impl FnOnce(&mut Vec<Value>) -> T,
    ) -> Result<T, WeftError> {
        let def = self.resolve(name)?;
        let key = def.scope.storage_key(name, ctx)?;
        let _guard = self.locks.lock(&key).await;
        let now = self.clock.epoch_ms();

        let previous = if def.persist {
            self.storage.get(&key).await?
        } else {
            self.ephemeral.lock().get(&key).filter(|s| !s.is_expired(now)).cloned()
        };
        let mut items = match previous.as_ref().map(|s| &s.value) {
            Some(Value::Array(a)) => a.clone(),
            Some(_) | None => match Self::default_of(def) {
                Value::Array(a) => a,
                _ => Vec::new(),
            },
        };
        let out = mutate(&mut items);

        let stored = match previous {
            Some(existing) => existing.updated(Value::Array(items), now, Self::ttl_ms(def)),
            None => StoredValue::new(Value::Array(items), now, Self::ttl_ms(def)),
        };
        if def.persist {
            self.storage.set(&key, stored.clone()).await?;
            self.cache.put(&key, stored, now);
        } else {
            self.ephemeral.lock().insert(key, stored);
        }
        Ok(out)
    }

    fn check_table(&self, table: &str) -> Result<(), WeftError> {
        if self.schema.table(table).is_none() {
            return Err(WeftError::validation(format!("unknown table '{table}'")));
        }
        Ok(())
    }

    pub async fn table_insert(&self, table: &str, row: Row) -> Result<(), WeftError> {
        self.check_table(table)?;
        self.storage.insert(table, row).await
    }

    pub async fn table_query(
        &self,
        table: &str,
        options: QueryOptions,
    ) -> Result<Vec<Row>, WeftError> {
        self.check_table(table)?;
        self.storage.query(table, options).await
    }

    pub async fn table_update(
        &self,
        table: &str,
        filter: Row,
        patch: Row,
    ) -> Result<u64, WeftError> {
        self.check_table(table)?;
        self.storage.update(table, filter, patch).await
    }

    pub async fn table_delete(&self, table: &str, filter: Row) -> Result<u64, WeftError> {
        self.check_table(table)?;
        self.storage.delete_rows(table, filter).await
    }

    /// Delete every variable under one scope entity (a removed guild,
    /// channel, user, or member), when the adapter signals the removal.
    /// Returns the number of deleted keys.
    pub async fn purge_entity(
        &self,
        scope: weft_core::Scope,
        ctx: &ScopeContext,
    ) -> Result<u64, WeftError> {
        let Some(prefix) = scope.entity_prefix(ctx) else {
            return Err(WeftError::validation(format!(
                "purge of {} scope needs its entity ids in context",
                scope.as_str()
            )));
        };
        let keys = self.storage.keys(Some(&format!("{prefix}*"))).await?;
        let mut deleted = 0;
        for key in keys {
            if self.storage.delete(&key).await? {
                deleted += 1;
            }
            self.cache.invalidate(&key);
        }
        self.ephemeral.lock().retain(|key, _| !key.starts_with(&prefix));
        Ok(deleted)
    }

    /// Drop cached state. Call on shutdown and on hot-swap.
    pub fn close(&self) {
        self.cache.clear();
        self.ephemeral.lock().clear();
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
