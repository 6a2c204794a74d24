// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Round-trip and idempotence properties (spec §8)

use crate::specs::prelude::*;
use weft_core::{ScopeContext, Value};
use weft_spec::BotSpec;

fn full_doc() -> serde_json::Value {
    serde_json::json!({
        "version": "1",
        "identity": { "name": "demo" },
        "permissions": { "mod": { "level": 50, "roles": ["R1"] } },
        "state": {
            "variables": {
                "xp": { "type": "number", "scope": "member", "default": 0 },
                "blob": { "type": "object", "scope": "global" },
            },
            "tables": {
                "notes": { "columns": { "id": { "primary": true }, "body": {} } },
            },
        },
        "commands": {
            "note": {
                "options": [ { "name": "body", "type": "string", "required": true } ],
                "actions": [ { "action": "db_insert", "table": "notes",
                               "data": { "id": "${uuid()}", "body": "${args.body}" } } ],
            },
        },
        "events": [
            { "event": "member_join", "throttle": "5s",
              "actions": { "action": "send_message", "channel": "c", "content": "hi" } },
        ],
        "flows": {
            "award": {
                "parameters": [ { "name": "amount", "type": "number", "default": 1 } ],
                "actions": [ { "action": "increment", "name": "xp", "by": "${amount}" } ],
            },
        },
        "pipes": {
            "stream": { "type": "websocket", "url": "wss://example.com",
                        "reconnect": { "max_attempts": 2, "delay": "1s" } },
        },
        "scheduler": { "jobs": [ { "name": "nightly", "cron": "0 0 3 * * *" } ] },
        "locale": { "en": { "hello": "hello {name}" } },
        "metrics": { "notes_total": { "help": "Notes created" } },
        "errors": { "min_severity": "warn", "behavior": "log" },
    })
}

#[test]
fn spec_documents_round_trip_semantically() {
    let spec = BotSpec::from_value(full_doc()).unwrap();
    let serialized = serde_json::to_value(&spec).unwrap();
    let reparsed = BotSpec::from_value(serialized).unwrap();
    assert_eq!(spec, reparsed);
}

#[test]
fn metrics_reset_then_idle_exports_empty() {
    let f = fixture(serde_json::json!({
        "metrics": { "things": { "help": "Things" } },
    }));
    f.runtime.metrics().increment("things", 3.0, &[]);
    f.runtime.metrics().set_gauge("level", 1.0);
    f.runtime.metrics().record("latency", 0.1);

    f.runtime.metrics().reset();
    assert_eq!(f.runtime.metrics().export_prometheus(), "");
}

#[tokio::test]
async fn set_then_get_returns_the_same_value_for_every_shape() {
    let f = fixture(serde_json::json!({
        "state": {
            "variables": { "blob": { "scope": "global" } },
        },
    }));
    let state = f.runtime.state();
    let ctx = ScopeContext::new();

    let shapes = [
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::Number(0.0),
        Value::Number(-2.5),
        Value::String(String::new()),
        Value::String("text".into()),
        Value::from_json(serde_json::json!([1, "two", { "three": 3 }])),
        Value::from_json(serde_json::json!({ "nested": { "deep": [true, null] } })),
    ];
    for value in shapes {
        state.set("blob", value.clone(), &ctx).await.unwrap();
        assert_eq!(state.get("blob", &ctx).await.unwrap(), value, "round trip for {value:?}");
    }
}

#[tokio::test]
async fn stored_falsy_values_shadow_defaults_until_deleted() {
    let f = fixture(serde_json::json!({
        "state": {
            "variables": { "xp": { "type": "number", "scope": "guild", "default": 10 } },
        },
    }));
    let state = f.runtime.state();
    let ctx = ScopeContext::new().guild("G");

    assert_eq!(state.get("xp", &ctx).await.unwrap(), Value::Number(10.0));
    state.set("xp", Value::Number(0.0), &ctx).await.unwrap();
    assert_eq!(state.get("xp", &ctx).await.unwrap(), Value::Number(0.0));
    state.delete("xp", &ctx).await.unwrap();
    assert_eq!(state.get("xp", &ctx).await.unwrap(), Value::Number(10.0));
}
