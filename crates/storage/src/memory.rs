// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory storage backend for tests and local runs

use crate::adapter::{
    glob_match, validate_identifier, validate_row_columns, validate_table_def, QueryOptions, Row,
    StorageAdapter, StoredValue,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use weft_core::{Clock, SystemClock, Value, WeftError};
use weft_spec::TableDef;

#[derive(Debug, Default)]
struct TableData {
    rows: Vec<Row>,
}

/// HashMap-backed adapter with the same observable semantics as the SQL
/// backends.
pub struct MemoryStorage<C: Clock = SystemClock> {
    kv: Mutex<HashMap<String, StoredValue>>,
    tables: Mutex<HashMap<String, TableData>>,
    clock: C,
}

impl MemoryStorage<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryStorage<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryStorage<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { kv: Mutex::new(HashMap::new()), tables: Mutex::new(HashMap::new()), clock }
    }
}

#[async_trait]
impl<C: Clock> StorageAdapter for MemoryStorage<C> {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, WeftError> {
        let now = self.clock.epoch_ms();
        let mut kv = self.kv.lock();
        match kv.get(key) {
            Some(entry) if entry.is_expired(now) => {
                // Lazy expiry on read
                kv.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: StoredValue) -> Result<(), WeftError> {
        self.kv.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, WeftError> {
        Ok(self.kv.lock().remove(key).is_some())
    }

    async fn has(&self, key: &str) -> Result<bool, WeftError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn keys(&self, glob: Option<&str>) -> Result<Vec<String>, WeftError> {
        let now = self.clock.epoch_ms();
        let kv = self.kv.lock();
        let mut out: Vec<String> = kv
            .iter()
            .filter(|(_, v)| !v.is_expired(now))
            .map(|(k, _)| k.clone())
            .filter(|k| glob.map(|g| glob_match(g, k)).unwrap_or(true))
            .collect();
        out.sort();
        Ok(out)
    }

    async fn clear(&self) -> Result<(), WeftError> {
        self.kv.lock().clear();
        Ok(())
    }

    async fn create_table(&self, def: &TableDef) -> Result<(), WeftError> {
        validate_table_def(def)?;
        self.tables.lock().entry(def.name.clone()).or_default();
        Ok(())
    }

    async fn insert(&self, table: &str, row: Row) -> Result<(), WeftError> {
        validate_identifier(table)?;
        validate_row_columns(&row)?;
        let mut tables = self.tables.lock();
        let data = tables
            .get_mut(table)
            .ok_or_else(|| WeftError::storage(format!("no such table '{table}'"), false))?;
        data.rows.push(row);
        Ok(())
    }

    async fn update(&self, table: &str, filter: Row, patch: Row) -> Result<u64, WeftError> {
        validate_identifier(table)?;
        validate_row_columns(&filter)?;
        validate_row_columns(&patch)?;
        let mut tables = self.tables.lock();
        let data = tables
            .get_mut(table)
            .ok_or_else(|| WeftError::storage(format!("no such table '{table}'"), false))?;
        let mut count = 0;
        for row in data.rows.iter_mut().filter(|r| matches_filter(r, &filter)) {
            for (column, value) in &patch {
                row.insert(column.clone(), value.clone());
            }
            count += 1;
        }
        Ok(count)
    }

    async fn delete_rows(&self, table: &str, filter: Row) -> Result<u64, WeftError> {
        validate_identifier(table)?;
        validate_row_columns(&filter)?;
        let mut tables = self.tables.lock();
        let data = tables
            .get_mut(table)
            .ok_or_else(|| WeftError::storage(format!("no such table '{table}'"), false))?;
        let before = data.rows.len();
        data.rows.retain(|r| !matches_filter(r, &filter));
        Ok((before - data.rows.len()) as u64)
    }

    async fn query(&self, table: &str, options: QueryOptions) -> Result<Vec<Row>, WeftError> {
        validate_identifier(table)?;
        validate_row_columns(&options.filter)?;
        for column in &options.select {
            validate_identifier(column)?;
        }
        let tables = self.tables.lock();
        let data = tables
            .get(table)
            .ok_or_else(|| WeftError::storage(format!("no such table '{table}'"), false))?;

        let mut rows: Vec<Row> =
            data.rows.iter().filter(|r| matches_filter(r, &options.filter)).cloned().collect();

        if let Some((column, descending)) = options.parsed_order() {
            rows.sort_by(|a, b| {
                let ord = compare_values(
                    a.get(&column).unwrap_or(&Value::Null),
                    b.get(&column).unwrap_or(&Value::Null),
                );
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        let offset = options.clamped_offset() as usize;
        let rows: Vec<Row> = rows.into_iter().skip(offset).collect();
        let rows: Vec<Row> = match options.clamped_limit() {
            Some(limit) => rows.into_iter().take(limit as usize).collect(),
            None => rows,
        };

        if options.select.is_empty() {
            return Ok(rows);
        }
        Ok(rows
            .into_iter()
            .map(|row| {
                options
                    .select
                    .iter()
                    .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                    .collect()
            })
            .collect())
    }
}

fn matches_filter(row: &Row, filter: &Row) -> bool {
    filter.iter().all(|(column, expected)| {
        row.get(column).map(|v| v.loose_eq(expected)).unwrap_or(expected.is_null())
    })
}

/// Total order for sorting: numbers numerically, otherwise by display
/// string; null sorts first.
fn compare_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        _ => a.to_display_string().cmp(&b.to_display_string()),
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
