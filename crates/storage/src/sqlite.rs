// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Embedded SQLite backend
//!
//! rusqlite is synchronous; every operation hops onto the blocking pool
//! with the connection behind a mutex. Identifiers reach SQL only after
//! validation and always double-quoted; values travel exclusively through
//! bound parameters.

use crate::adapter::{
    glob_match, is_primitive_default, validate_identifier, validate_row_columns,
    validate_table_def, QueryOptions, Row, StorageAdapter, StoredValue,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use weft_core::{Clock, SystemClock, Value, WeftError};
use weft_spec::{ColumnType, TableDef};

/// Durable storage over an embedded SQLite database.
pub struct SqliteStorage<C: Clock = SystemClock> {
    conn: Arc<Mutex<Connection>>,
    /// Declared table shapes, for typed decoding of query results.
    defs: Arc<Mutex<HashMap<String, TableDef>>>,
    clock: C,
}

impl SqliteStorage<SystemClock> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WeftError> {
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::init(conn, SystemClock)
    }

    pub fn open_in_memory() -> Result<Self, WeftError> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::init(conn, SystemClock)
    }
}

impl<C: Clock> SqliteStorage<C> {
    pub fn open_with_clock(path: impl AsRef<Path>, clock: C) -> Result<Self, WeftError> {
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::init(conn, clock)
    }

    pub fn open_in_memory_with_clock(clock: C) -> Result<Self, WeftError> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::init(conn, clock)
    }

    fn init(conn: Connection, clock: C) -> Result<Self, WeftError> {
        // journal_mode returns a row, so it cannot ride in execute_batch
        conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
            .map_err(storage_err)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                 key        TEXT PRIMARY KEY,
                 value      TEXT NOT NULL,
                 type_tag   TEXT NOT NULL,
                 created_at INTEGER NOT NULL,
                 updated_at INTEGER NOT NULL,
                 expires_at INTEGER
             );",
        )
        .map_err(storage_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            defs: Arc::new(Mutex::new(HashMap::new())),
            clock,
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, WeftError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, WeftError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| WeftError::storage(format!("blocking task failed: {e}"), false))?
    }

    fn table_def(&self, table: &str) -> Option<TableDef> {
        self.defs.lock().get(table).cloned()
    }
}

#[async_trait]
impl<C: Clock> StorageAdapter for SqliteStorage<C> {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, WeftError> {
        let key = key.to_string();
        let now = self.clock.epoch_ms();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT value, type_tag, created_at, updated_at, expires_at
                     FROM kv WHERE key = ?1",
                )
                .map_err(storage_err)?;
            let entry = stmt
                .query_row([&key], |row| {
                    Ok(StoredValue {
                        value: decode_json_text(&row.get::<_, String>(0)?, &row.get::<_, String>(1)?),
                        type_tag: row.get(1)?,
                        created_at: row.get(2)?,
                        updated_at: row.get(3)?,
                        expires_at: row.get(4)?,
                    })
                })
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(storage_err(other)),
                })?;

            match entry {
                Some(v) if v.is_expired(now) => {
                    // Lazy expiry on read
                    conn.execute("DELETE FROM kv WHERE key = ?1", [&key]).map_err(storage_err)?;
                    Ok(None)
                }
                other => Ok(other),
            }
        })
        .await
    }

    async fn set(&self, key: &str, value: StoredValue) -> Result<(), WeftError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let text = serde_json::to_string(&value.value.to_json())
                .map_err(|e| WeftError::storage(format!("unencodable value: {e}"), false))?;
            conn.execute(
                "INSERT INTO kv (key, value, type_tag, created_at, updated_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     type_tag = excluded.type_tag,
                     updated_at = excluded.updated_at,
                     expires_at = excluded.expires_at",
                rusqlite::params![
                    key,
                    text,
                    value.type_tag,
                    value.created_at,
                    value.updated_at,
                    value.expires_at,
                ],
            )
            .map_err(storage_err)?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<bool, WeftError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let n = conn.execute("DELETE FROM kv WHERE key = ?1", [&key]).map_err(storage_err)?;
            Ok(n > 0)
        })
        .await
    }

    async fn has(&self, key: &str) -> Result<bool, WeftError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn keys(&self, glob: Option<&str>) -> Result<Vec<String>, WeftError> {
        let glob = glob.map(|g| g.to_string());
        let now = self.clock.epoch_ms();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT key FROM kv WHERE expires_at IS NULL OR expires_at > ?1 ORDER BY key",
                )
                .map_err(storage_err)?;
            let keys = stmt
                .query_map([now], |row| row.get::<_, String>(0))
                .map_err(storage_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(storage_err)?;
            Ok(keys
                .into_iter()
                .filter(|k| glob.as_deref().map(|g| glob_match(g, k)).unwrap_or(true))
                .collect())
        })
        .await
    }

    async fn clear(&self) -> Result<(), WeftError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv", []).map_err(storage_err)?;
            Ok(())
        })
        .await
    }

    async fn create_table(&self, def: &TableDef) -> Result<(), WeftError> {
        validate_table_def(def)?;
        let ddl = build_ddl(def);
        tracing::debug!(table = %def.name, "ensuring table");
        let def_clone = def.clone();
        let defs = Arc::clone(&self.defs);
        self.with_conn(move |conn| {
            conn.execute_batch(&ddl).map_err(storage_err)?;
            defs.lock().insert(def_clone.name.clone(), def_clone);
            Ok(())
        })
        .await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<(), WeftError> {
        validate_identifier(table)?;
        validate_row_columns(&row)?;
        let table = table.to_string();
        self.with_conn(move |conn| {
            let columns: Vec<String> = row.keys().map(|c| format!("\"{c}\"")).collect();
            let placeholders: Vec<String> =
                (1..=row.len()).map(|i| format!("?{i}")).collect();
            let sql = format!(
                "INSERT INTO \"{table}\" ({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(", ")
            );
            let params: Vec<SqlValue> = row.values().map(bind_value).collect();
            conn.execute(&sql, rusqlite::params_from_iter(params)).map_err(storage_err)?;
            Ok(())
        })
        .await
    }

    async fn update(&self, table: &str, filter: Row, patch: Row) -> Result<u64, WeftError> {
        validate_identifier(table)?;
        validate_row_columns(&filter)?;
        validate_row_columns(&patch)?;
        if patch.is_empty() {
            return Ok(0);
        }
        let table = table.to_string();
        self.with_conn(move |conn| {
            let mut params: Vec<SqlValue> = Vec::new();
            let mut sets = Vec::new();
            for (column, value) in &patch {
                params.push(bind_value(value));
                sets.push(format!("\"{column}\" = ?{}", params.len()));
            }
            let where_clause = build_where(&filter, &mut params);
            let sql =
                format!("UPDATE \"{table}\" SET {}{}", sets.join(", "), where_clause);
            let n = conn
                .execute(&sql, rusqlite::params_from_iter(params))
                .map_err(storage_err)?;
            Ok(n as u64)
        })
        .await
    }

    async fn delete_rows(&self, table: &str, filter: Row) -> Result<u64, WeftError> {
        validate_identifier(table)?;
        validate_row_columns(&filter)?;
        let table = table.to_string();
        self.with_conn(move |conn| {
            let mut params: Vec<SqlValue> = Vec::new();
            let where_clause = build_where(&filter, &mut params);
            let sql = format!("DELETE FROM \"{table}\"{where_clause}");
            let n = conn
                .execute(&sql, rusqlite::params_from_iter(params))
                .map_err(storage_err)?;
            Ok(n as u64)
        })
        .await
    }

    async fn query(&self, table: &str, options: QueryOptions) -> Result<Vec<Row>, WeftError> {
        validate_identifier(table)?;
        validate_row_columns(&options.filter)?;
        for column in &options.select {
            validate_identifier(column)?;
        }
        let def = self.table_def(table);
        let table = table.to_string();
        self.with_conn(move |conn| {
            let projection = if options.select.is_empty() {
                "*".to_string()
            } else {
                options
                    .select
                    .iter()
                    .map(|c| format!("\"{c}\""))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let mut params: Vec<SqlValue> = Vec::new();
            let where_clause = build_where(&options.filter, &mut params);
            let order_clause = match options.parsed_order() {
                Some((column, true)) => format!(" ORDER BY \"{column}\" DESC"),
                Some((column, false)) => format!(" ORDER BY \"{column}\" ASC"),
                None => String::new(),
            };
            let limit = options.clamped_limit().map(|l| l as i64).unwrap_or(-1);
            let offset = options.clamped_offset();
            let sql = format!(
                "SELECT {projection} FROM \"{table}\"{where_clause}{order_clause} \
                 LIMIT {limit} OFFSET {offset}"
            );

            let mut stmt = conn.prepare(&sql).map_err(storage_err)?;
            let column_names: Vec<String> =
                stmt.column_names().iter().map(|s| s.to_string()).collect();
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params), |sql_row| {
                    let mut row = Row::new();
                    for (i, name) in column_names.iter().enumerate() {
                        let column_type =
                            def.as_ref().and_then(|d| d.columns.get(name)).map(|c| c.column_type);
                        row.insert(name.clone(), decode_sql(sql_row.get_ref(i)?, column_type));
                    }
                    Ok(row)
                })
                .map_err(storage_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(storage_err)?;
            Ok(rows)
        })
        .await
    }
}

fn storage_err(e: rusqlite::Error) -> WeftError {
    let retriable = matches!(
        e.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked)
    );
    WeftError::storage(e.to_string(), retriable)
}

/// Build `CREATE TABLE` + index DDL from a validated definition.
fn build_ddl(def: &TableDef) -> String {
    let mut columns = Vec::new();
    for (name, column) in &def.columns {
        let mut parts = vec![format!("\"{name}\""), sql_type(column.column_type).to_string()];
        if column.primary {
            parts.push("PRIMARY KEY".to_string());
        }
        if !column.nullable && !column.primary {
            parts.push("NOT NULL".to_string());
        }
        if column.unique && !column.primary {
            parts.push("UNIQUE".to_string());
        }
        if let Some(default) = &column.default {
            // Primitive defaults only; complex values are silently skipped
            if is_primitive_default(default) {
                parts.push(format!("DEFAULT {}", sql_literal(default)));
            }
        }
        columns.push(parts.join(" "));
    }
    let mut ddl =
        format!("CREATE TABLE IF NOT EXISTS \"{}\" ({});\n", def.name, columns.join(", "));
    for (name, column) in &def.columns {
        if column.index && !column.primary {
            ddl.push_str(&format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{}_{}\" ON \"{}\" (\"{}\");\n",
                def.name, name, def.name, name
            ));
        }
    }
    for (i, index) in def.composite_indexes.iter().enumerate() {
        let cols: Vec<String> = index.iter().map(|c| format!("\"{c}\"")).collect();
        ddl.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS \"idx_{}_c{}\" ON \"{}\" ({});\n",
            def.name,
            i,
            def.name,
            cols.join(", ")
        ));
    }
    ddl
}

fn sql_type(t: ColumnType) -> &'static str {
    match t {
        ColumnType::String => "TEXT",
        ColumnType::Number => "REAL",
        ColumnType::Bool => "INTEGER",
        ColumnType::Json => "TEXT",
    }
}

/// Literal rendering for primitive DDL defaults. Strings are single-quote
/// escaped; everything else renders as a bare literal.
fn sql_literal(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        _ => "NULL".to_string(),
    }
}

/// `WHERE` clause over equality conditions; null compares with `IS NULL`.
fn build_where(filter: &Row, params: &mut Vec<SqlValue>) -> String {
    if filter.is_empty() {
        return String::new();
    }
    let mut conditions = Vec::new();
    for (column, value) in filter {
        if value.is_null() {
            conditions.push(format!("\"{column}\" IS NULL"));
        } else {
            params.push(bind_value(value));
            conditions.push(format!("\"{column}\" = ?{}", params.len()));
        }
    }
    format!(" WHERE {}", conditions.join(" AND "))
}

fn bind_value(v: &Value) -> SqlValue {
    match v {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Number(n) => SqlValue::Real(*n),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        other => SqlValue::Text(serde_json::to_string(&other.to_json()).unwrap_or_default()),
    }
}

fn decode_sql(v: rusqlite::types::ValueRef<'_>, column_type: Option<ColumnType>) -> Value {
    use rusqlite::types::ValueRef;
    match (v, column_type) {
        (ValueRef::Null, _) => Value::Null,
        (ValueRef::Integer(n), Some(ColumnType::Bool)) => Value::Bool(n != 0),
        (ValueRef::Integer(n), _) => Value::Number(n as f64),
        (ValueRef::Real(n), _) => Value::Number(n),
        (ValueRef::Text(t), Some(ColumnType::Json)) => {
            let text = String::from_utf8_lossy(t);
            serde_json::from_str::<serde_json::Value>(&text)
                .map(Value::from_json)
                .unwrap_or_else(|_| Value::String(text.into_owned()))
        }
        (ValueRef::Text(t), _) => Value::String(String::from_utf8_lossy(t).into_owned()),
        (ValueRef::Blob(b), _) => Value::Bytes(b.to_vec()),
    }
}

/// Decode a KV `value` JSON column back into a runtime value, honoring the
/// stored type tag (bytes round-trip through number arrays).
fn decode_json_text(text: &str, type_tag: &str) -> Value {
    let value = serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from_json)
        .unwrap_or(Value::Null);
    if type_tag == "bytes" {
        if let Value::Array(items) = &value {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|v| v.as_number().filter(|n| (0.0..=255.0).contains(n)).map(|n| n as u8))
                .collect();
            if let Some(b) = bytes {
                return Value::Bytes(b);
            }
        }
    }
    value
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
