// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The storage adapter contract
//!
//! Identifier injection is impossible by construction: every table and
//! column name is validated against `[A-Za-z_][A-Za-z0-9_]*` before any
//! I/O, and user values only ever travel through parameters. `order_by`
//! is re-parsed and silently dropped when malformed. `limit` and
//! `offset` are clamped.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weft_core::{Value, WeftError};
use weft_spec::TableDef;

/// Hard cap on `limit`.
pub const LIMIT_MAX: u64 = 10_000;

/// Hard cap on `offset`.
pub const OFFSET_MAX: u64 = 1_000_000;

/// One persisted KV entry. Timestamps are millisecond epochs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue {
    pub value: Value,
    pub type_tag: String,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl StoredValue {
    pub fn new(value: Value, now_ms: u64, ttl_ms: Option<u64>) -> Self {
        Self {
            type_tag: value.type_tag().to_string(),
            value,
            created_at: now_ms,
            updated_at: now_ms,
            expires_at: ttl_ms.map(|ttl| now_ms + ttl),
        }
    }

    /// Expired entries are treated as absent everywhere.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at.is_some_and(|at| at <= now_ms)
    }

    /// Rewrite for an update at `now_ms`, keeping `created_at`.
    pub fn updated(mut self, value: Value, now_ms: u64, ttl_ms: Option<u64>) -> Self {
        self.type_tag = value.type_tag().to_string();
        self.value = value;
        self.updated_at = now_ms;
        self.expires_at = ttl_ms.map(|ttl| now_ms + ttl);
        self
    }
}

/// A table row: ordered column name → value.
pub type Row = IndexMap<String, Value>;

/// Query shape for `query()`: equality filter, projection, order, window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Equality conditions, ANDed.
    pub filter: Row,
    /// Columns to project; all columns when empty.
    pub select: Vec<String>,
    /// `column` or `column ASC|DESC`; anything else is dropped.
    pub order_by: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl QueryOptions {
    pub fn clamped_limit(&self) -> Option<u64> {
        self.limit.map(|l| l.min(LIMIT_MAX))
    }

    pub fn clamped_offset(&self) -> u64 {
        self.offset.unwrap_or(0).min(OFFSET_MAX)
    }

    /// Parsed `(column, descending)` or `None` when absent or malformed.
    pub fn parsed_order(&self) -> Option<(String, bool)> {
        parse_order_by(self.order_by.as_deref()?)
    }
}

/// Uniform contract over in-memory and SQL backends.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    // --- key-value ---
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, WeftError>;
    async fn set(&self, key: &str, value: StoredValue) -> Result<(), WeftError>;
    async fn delete(&self, key: &str) -> Result<bool, WeftError>;
    async fn has(&self, key: &str) -> Result<bool, WeftError>;
    /// Keys matching a glob (`*` wildcard); all keys when `None`.
    async fn keys(&self, glob: Option<&str>) -> Result<Vec<String>, WeftError>;
    async fn clear(&self) -> Result<(), WeftError>;

    // --- tabular ---
    async fn create_table(&self, def: &TableDef) -> Result<(), WeftError>;
    async fn insert(&self, table: &str, row: Row) -> Result<(), WeftError>;
    async fn update(&self, table: &str, filter: Row, patch: Row) -> Result<u64, WeftError>;
    async fn delete_rows(&self, table: &str, filter: Row) -> Result<u64, WeftError>;
    async fn query(&self, table: &str, options: QueryOptions) -> Result<Vec<Row>, WeftError>;
}

/// Reject anything but `[A-Za-z_][A-Za-z0-9_]*` before storage I/O.
pub fn validate_identifier(name: &str) -> Result<(), WeftError> {
    let mut chars = name.chars();
    let valid_head = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(WeftError::validation(format!("invalid identifier '{name}'")))
    }
}

/// Validate a table definition's identifiers before emitting DDL.
pub(crate) fn validate_table_def(def: &TableDef) -> Result<(), WeftError> {
    validate_identifier(&def.name)?;
    for column in def.columns.keys() {
        validate_identifier(column)?;
    }
    for index in &def.composite_indexes {
        for column in index {
            validate_identifier(column)?;
        }
    }
    Ok(())
}

/// Validate every column name appearing in a row or filter.
pub(crate) fn validate_row_columns(row: &Row) -> Result<(), WeftError> {
    for column in row.keys() {
        validate_identifier(column)?;
    }
    Ok(())
}

/// Parse `column (ASC|DESC)?`; anything else is dropped.
pub(crate) fn parse_order_by(spec: &str) -> Option<(String, bool)> {
    let mut parts = spec.split_whitespace();
    let column = parts.next()?;
    validate_identifier(column).ok()?;
    let descending = match parts.next() {
        None => false,
        Some(dir) if dir.eq_ignore_ascii_case("asc") => false,
        Some(dir) if dir.eq_ignore_ascii_case("desc") => true,
        Some(_) => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((column.to_string(), descending))
}

/// Simple `*` glob over keys.
pub(crate) fn glob_match(pattern: &str, key: &str) -> bool {
    fn inner(p: &[u8], k: &[u8]) -> bool {
        match (p.first(), k.first()) {
            (None, None) => true,
            (Some(b'*'), _) => {
                inner(&p[1..], k) || (!k.is_empty() && inner(p, &k[1..]))
            }
            (Some(pc), Some(kc)) if pc == kc => inner(&p[1..], &k[1..]),
            _ => false,
        }
    }
    inner(pattern.as_bytes(), key.as_bytes())
}

/// Whether a default value is primitive enough to emit into DDL.
pub(crate) fn is_primitive_default(v: &serde_json::Value) -> bool {
    matches!(
        v,
        serde_json::Value::Null
            | serde_json::Value::Bool(_)
            | serde_json::Value::Number(_)
            | serde_json::Value::String(_)
    )
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
