// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scoped variables never bleed across their partition keys (spec
//! scenario 4), on both storage backends

use crate::specs::prelude::*;
use std::sync::Arc;
use weft_core::{FakeClock, ScopeContext, Value};
use weft_storage::{SqliteStorage, StateManager, StorageAdapter};

fn pref_schema() -> weft_spec::StateSchema {
    let mut schema: weft_spec::StateSchema = serde_json::from_value(serde_json::json!({
        "variables": {
            "pref": { "type": "string", "scope": "user" },
            "xp": { "type": "number", "scope": "member", "default": 0 },
        },
    }))
    .unwrap();
    schema.hydrate();
    schema
}

#[tokio::test]
async fn user_scope_is_isolated_and_ignores_extra_guild_id() {
    let f = fixture(serde_json::json!({
        "state": {
            "variables": { "pref": { "type": "string", "scope": "user" } },
        },
    }));
    let state = f.runtime.state();

    state.set("pref", Value::String("A".into()), &ScopeContext::new().user("U1")).await.unwrap();
    state.set("pref", Value::String("B".into()), &ScopeContext::new().user("U2")).await.unwrap();

    assert_eq!(
        state.get("pref", &ScopeContext::new().user("U1")).await.unwrap(),
        Value::String("A".into())
    );
    assert_eq!(
        state.get("pref", &ScopeContext::new().user("U2")).await.unwrap(),
        Value::String("B".into())
    );
    // Documented behavior: a guild id alongside a user id resolves to the
    // user scope
    assert_eq!(
        state.get("pref", &ScopeContext::new().user("U1").guild("G")).await.unwrap(),
        Value::String("A".into())
    );
}

#[tokio::test]
async fn member_scope_partitions_by_guild_and_user_on_sqlite() {
    let clock = FakeClock::new();
    let storage: Arc<dyn StorageAdapter> =
        Arc::new(SqliteStorage::open_in_memory_with_clock(clock.clone()).unwrap());
    let state = StateManager::new(storage, pref_schema(), clock);

    let g1u1 = ScopeContext::new().guild("G1").user("U1");
    let g1u2 = ScopeContext::new().guild("G1").user("U2");
    let g2u1 = ScopeContext::new().guild("G2").user("U1");

    state.set("xp", Value::Number(5.0), &g1u1).await.unwrap();
    state.set("xp", Value::Number(7.0), &g1u2).await.unwrap();

    assert_eq!(state.get("xp", &g1u1).await.unwrap(), Value::Number(5.0));
    assert_eq!(state.get("xp", &g1u2).await.unwrap(), Value::Number(7.0));
    // Same user in another guild still sees the default
    assert_eq!(state.get("xp", &g2u1).await.unwrap(), Value::Number(0.0));
}

#[tokio::test]
async fn writes_under_one_key_never_affect_reads_under_another() {
    let f = fixture(serde_json::json!({
        "state": {
            "variables": { "pref": { "type": "string", "scope": "user" } },
        },
    }));
    let state = f.runtime.state();

    for i in 0..20 {
        let ctx = ScopeContext::new().user(format!("U{i}"));
        state.set("pref", Value::Number(i as f64), &ctx).await.unwrap();
    }
    for i in 0..20 {
        let ctx = ScopeContext::new().user(format!("U{i}"));
        assert_eq!(state.get("pref", &ctx).await.unwrap(), Value::Number(i as f64));
    }
}
