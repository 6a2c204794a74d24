// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::memory::MemoryStorage;
use weft_core::{FakeClock, RuntimeErrorKind};

fn schema() -> StateSchema {
    let mut s: StateSchema = serde_json::from_value(serde_json::json!({
        "variables": {
            "xp": { "type": "number", "scope": "guild", "default": 0 },
            "pref": { "type": "string", "scope": "user" },
            "tags": { "type": "array", "scope": "global", "default": [] },
            "token": { "type": "string", "scope": "global", "ttl": "1s" },
            "session": { "type": "object", "scope": "user", "persist": false },
        },
        "tables": {
            "warnings": { "columns": { "id": { "primary": true }, "count": { "type": "number" } } },
        },
    }))
    .unwrap();
    s.hydrate();
    s
}

fn manager(clock: FakeClock) -> StateManager<FakeClock> {
    let storage = Arc::new(MemoryStorage::with_clock(clock.clone()));
    StateManager::new(storage, schema(), clock)
}

fn guild(id: &str) -> ScopeContext {
    ScopeContext::new().guild(id)
}

fn user(id: &str) -> ScopeContext {
    ScopeContext::new().user(id)
}

#[tokio::test]
async fn default_until_first_write_then_stored_value() {
    let m = manager(FakeClock::new());
    let ctx = guild("G1");
    assert_eq!(m.get("xp", &ctx).await.unwrap(), Value::Number(0.0));
    assert!(!m.has("xp", &ctx).await.unwrap());

    m.set("xp", Value::Number(5.0), &ctx).await.unwrap();
    assert_eq!(m.get("xp", &ctx).await.unwrap(), Value::Number(5.0));
    assert!(m.has("xp", &ctx).await.unwrap());
}

#[tokio::test]
async fn falsy_stored_values_shadow_defaults() {
    let m = manager(FakeClock::new());
    let ctx = guild("G1");
    m.set("xp", Value::Number(7.0), &ctx).await.unwrap();
    m.set("xp", Value::Number(0.0), &ctx).await.unwrap();
    // 0 is a real stored value, not "fall back to default"
    assert_eq!(m.get("xp", &ctx).await.unwrap(), Value::Number(0.0));
    assert!(m.has("xp", &ctx).await.unwrap());
}

#[tokio::test]
async fn delete_restores_default_visibility() {
    let m = manager(FakeClock::new());
    let ctx = guild("G1");
    m.set("xp", Value::Number(9.0), &ctx).await.unwrap();
    assert!(m.delete("xp", &ctx).await.unwrap());
    assert_eq!(m.get("xp", &ctx).await.unwrap(), Value::Number(0.0));
    assert!(!m.delete("xp", &ctx).await.unwrap());
}

#[tokio::test]
async fn scope_isolation_across_contexts() {
    let m = manager(FakeClock::new());
    m.set("pref", Value::String("A".into()), &user("U1")).await.unwrap();
    m.set("pref", Value::String("B".into()), &user("U2")).await.unwrap();
    assert_eq!(m.get("pref", &user("U1")).await.unwrap(), Value::String("A".into()));
    assert_eq!(m.get("pref", &user("U2")).await.unwrap(), Value::String("B".into()));
    // Extra guild id in context does not change user-scope resolution
    let mixed = ScopeContext::new().user("U1").guild("G1");
    assert_eq!(m.get("pref", &mixed).await.unwrap(), Value::String("A".into()));
}

#[tokio::test]
async fn guild_writes_are_isolated_per_guild() {
    let m = manager(FakeClock::new());
    m.set("xp", Value::Number(1.0), &guild("G1")).await.unwrap();
    assert_eq!(m.get("xp", &guild("G2")).await.unwrap(), Value::Number(0.0));
}

#[tokio::test]
async fn missing_scope_context_is_a_scope_violation() {
    let m = manager(FakeClock::new());
    let err = m.get("xp", &ScopeContext::new()).await.unwrap_err();
    assert!(matches!(
        err,
        WeftError::Runtime { kind: RuntimeErrorKind::ScopeViolation, .. }
    ));
}

#[tokio::test]
async fn unknown_variable_is_a_validation_error() {
    let m = manager(FakeClock::new());
    let err = m.get("nope", &ScopeContext::new()).await.unwrap_err();
    assert!(matches!(err, WeftError::Validation(_)));
}

#[tokio::test]
async fn ttl_expires_stored_values() {
    let clock = FakeClock::new();
    let m = manager(clock.clone());
    let ctx = ScopeContext::new();
    m.set("token", Value::String("t".into()), &ctx).await.unwrap();
    assert_eq!(m.get("token", &ctx).await.unwrap(), Value::String("t".into()));

    clock.advance(Duration::from_millis(1_001));
    assert_eq!(m.get("token", &ctx).await.unwrap(), Value::Null);
    assert!(!m.has("token", &ctx).await.unwrap());
}

#[tokio::test]
async fn concurrent_increments_sum_exactly() {
    let clock = FakeClock::new();
    let m = Arc::new(manager(clock));
    let ctx = guild("G1");

    let mut handles = Vec::new();
    for _ in 0..100 {
        let m = Arc::clone(&m);
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move { m.increment("xp", 1.0, &ctx).await.unwrap() }));
    }
    let mut returns = Vec::new();
    for h in handles {
        returns.push(h.await.unwrap() as i64);
    }

    assert_eq!(m.get("xp", &ctx).await.unwrap(), Value::Number(100.0));
    // Each call saw a distinct prefix sum 1..=100
    returns.sort_unstable();
    assert_eq!(returns, (1..=100).collect::<Vec<i64>>());
}

#[tokio::test]
async fn decrement_is_negative_increment() {
    let m = manager(FakeClock::new());
    let ctx = guild("G1");
    m.set("xp", Value::Number(10.0), &ctx).await.unwrap();
    assert_eq!(m.decrement("xp", 3.0, &ctx).await.unwrap(), 7.0);
    assert_eq!(m.get("xp", &ctx).await.unwrap(), Value::Number(7.0));
}

#[tokio::test]
async fn list_push_and_remove() {
    let m = manager(FakeClock::new());
    let ctx = ScopeContext::new();
    assert_eq!(m.list_push("tags", Value::String("a".into()), &ctx).await.unwrap(), 1);
    assert_eq!(m.list_push("tags", Value::String("b".into()), &ctx).await.unwrap(), 2);
    assert!(m.list_remove("tags", Value::String("a".into()), &ctx).await.unwrap());
    assert!(!m.list_remove("tags", Value::String("z".into()), &ctx).await.unwrap());
    assert_eq!(
        m.get("tags", &ctx).await.unwrap(),
        Value::Array(vec![Value::String("b".into())])
    );
}

#[tokio::test]
async fn ephemeral_variables_skip_storage() {
    let clock = FakeClock::new();
    let storage = Arc::new(MemoryStorage::with_clock(clock.clone()));
    let m = StateManager::new(Arc::clone(&storage) as Arc<dyn crate::StorageAdapter>, schema(), clock);

    let ctx = user("U1");
    m.set("session", Value::String("live".into()), &ctx).await.unwrap();
    assert_eq!(m.get("session", &ctx).await.unwrap(), Value::String("live".into()));
    // Nothing reached the adapter
    assert!(storage.keys(None).await.unwrap().is_empty());

    m.close();
    assert_eq!(m.get("session", &ctx).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn unknown_table_is_rejected_before_storage() {
    let m = manager(FakeClock::new());
    let err = m.table_insert("nope", Row::new()).await.unwrap_err();
    assert!(matches!(err, WeftError::Validation(_)));
}

#[tokio::test]
async fn declared_tables_work_end_to_end() {
    let m = manager(FakeClock::new());
    m.ensure_tables().await.unwrap();
    let mut row = Row::new();
    row.insert("id".into(), Value::String("w1".into()));
    row.insert("count".into(), Value::Number(2.0));
    m.table_insert("warnings", row).await.unwrap();
    let rows = m.table_query("warnings", QueryOptions::default()).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn purging_a_scope_entity_removes_its_variables_only() {
    let m = manager(FakeClock::new());
    m.set("xp", Value::Number(1.0), &guild("G1")).await.unwrap();
    m.set("xp", Value::Number(2.0), &guild("G2")).await.unwrap();
    m.set("pref", Value::String("A".into()), &user("U1")).await.unwrap();

    let deleted = m.purge_entity(weft_core::Scope::Guild, &guild("G1")).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(m.get("xp", &guild("G1")).await.unwrap(), Value::Number(0.0));
    assert_eq!(m.get("xp", &guild("G2")).await.unwrap(), Value::Number(2.0));
    assert_eq!(m.get("pref", &user("U1")).await.unwrap(), Value::String("A".into()));

    let err = m.purge_entity(weft_core::Scope::Guild, &ScopeContext::new()).await.unwrap_err();
    assert!(matches!(err, WeftError::Validation(_)));
}

#[tokio::test]
async fn cache_capacity_bounds_resident_entries() {
    let clock = FakeClock::new();
    let storage = Arc::new(MemoryStorage::with_clock(clock.clone()));
    let m = StateManager::new(storage, schema(), clock).with_cache(4, Duration::from_secs(60));

    for i in 0..20 {
        m.set("xp", Value::Number(i as f64), &guild(&format!("G{i}"))).await.unwrap();
    }
    // Values are still correct (cache is a cache, not the store)
    assert_eq!(m.get("xp", &guild("G0")).await.unwrap(), Value::Number(0.0));
    assert_eq!(m.get("xp", &guild("G19")).await.unwrap(), Value::Number(19.0));
}
