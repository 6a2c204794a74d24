// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debounce collapse, throttle windows, and once handlers (spec
//! scenarios 2 and 3)

use crate::specs::prelude::*;
use std::time::Duration;
use weft_core::{ScopeContext, Value};

async fn counter(f: &Fixture, name: &str) -> f64 {
    f.runtime
        .state()
        .get(name, &ScopeContext::new())
        .await
        .unwrap()
        .coerce_number()
}

#[tokio::test]
async fn debounced_handler_collapses_a_burst_to_one_execution() {
    let f = fixture(serde_json::json!({
        "state": {
            "variables": { "bursts": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "X", "debounce": "100ms",
              "actions": [ { "action": "increment", "name": "bursts", "by": 1 } ] },
        ],
    }));

    // Ten emits at 10ms intervals
    for _ in 0..10 {
        f.runtime.emit("X", Value::Null).await;
        f.clock.advance(Duration::from_millis(10));
    }
    // 200ms after the burst started the quiet period has elapsed
    f.clock.advance(Duration::from_millis(100));
    f.runtime.pump().await;

    assert_eq!(counter(&f, "bursts").await, 1.0);
}

#[tokio::test]
async fn no_execution_happens_between_close_emits() {
    let f = fixture(serde_json::json!({
        "state": {
            "variables": { "runs": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "X", "debounce": "100ms",
              "actions": [ { "action": "increment", "name": "runs", "by": 1 } ] },
        ],
    }));

    f.runtime.emit("X", Value::Null).await;
    f.clock.advance(Duration::from_millis(50));
    f.runtime.pump().await;
    assert_eq!(counter(&f, "runs").await, 0.0);

    // A second emit within the window resets the quiet period
    f.runtime.emit("X", Value::Null).await;
    f.clock.advance(Duration::from_millis(99));
    f.runtime.pump().await;
    assert_eq!(counter(&f, "runs").await, 0.0);

    f.clock.advance(Duration::from_millis(1));
    f.runtime.pump().await;
    assert_eq!(counter(&f, "runs").await, 1.0);
}

#[tokio::test]
async fn throttled_handler_starts_at_most_once_per_window() {
    let f = fixture(serde_json::json!({
        "state": {
            "variables": { "starts": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "T", "throttle": "100ms",
              "actions": [ { "action": "increment", "name": "starts", "by": 1 } ] },
        ],
    }));

    for _ in 0..5 {
        f.runtime.emit("T", Value::Null).await;
        f.clock.advance(Duration::from_millis(10));
    }
    // First emit ran immediately; the rest fell in the window
    assert_eq!(counter(&f, "starts").await, 1.0);

    f.clock.advance(Duration::from_millis(100));
    f.runtime.emit("T", Value::Null).await;
    assert_eq!(counter(&f, "starts").await, 2.0);
}

#[tokio::test]
async fn once_handler_survives_only_one_emit_until_rebuild() {
    let doc = serde_json::json!({
        "state": {
            "variables": { "greeted": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "Y", "once": true,
              "actions": [ { "action": "increment", "name": "greeted", "by": 1 } ] },
        ],
    });
    let f = fixture(doc.clone());

    f.runtime.emit("Y", Value::Null).await;
    f.runtime.emit("Y", Value::Null).await;
    assert_eq!(counter(&f, "greeted").await, 1.0);

    // A rebuilt registration (hot swap) runs again
    f.runtime
        .hot_swap(weft_spec::BotSpec::from_value(doc).unwrap())
        .await
        .unwrap();
    f.runtime.emit("Y", Value::Null).await;
    assert_eq!(counter(&f, "greeted").await, 2.0);
}
