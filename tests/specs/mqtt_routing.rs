// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MQTT wildcard routing through the event layer (spec scenario 5)
//!
//! The broker-side transport cannot run in tests; pipe events are
//! injected at the manager boundary, which exercises the same
//! subscription-matching and router dispatch the live pipe uses.

use crate::specs::prelude::*;
use weft_core::{ScopeContext, Value};

fn sensors_spec() -> serde_json::Value {
    serde_json::json!({
        "state": {
            "variables": {
                "h1": { "type": "number", "scope": "global", "default": 0 },
                "h2": { "type": "number", "scope": "global", "default": 0 },
                "h3": { "type": "number", "scope": "global", "default": 0 },
            },
        },
        "pipes": {
            "broker": {
                "type": "mqtt",
                "host": "broker.local",
                "subscriptions": [
                    "sensors/+/temperature",
                    "sensors/#",
                    "sensors/room1/temperature",
                ],
            },
        },
        "events": [
            { "event": "pipe:broker:sensors/+/temperature",
              "actions": [ { "action": "increment", "name": "h1", "by": 1 } ] },
            { "event": "pipe:broker:sensors/#",
              "actions": [ { "action": "increment", "name": "h2", "by": 1 } ] },
            { "event": "pipe:broker:sensors/room1/temperature",
              "actions": [ { "action": "increment", "name": "h3", "by": 1 } ] },
        ],
    })
}

async fn counters(f: &Fixture) -> (f64, f64, f64) {
    let ctx = ScopeContext::new();
    let state = f.runtime.state();
    (
        state.get("h1", &ctx).await.unwrap().coerce_number(),
        state.get("h2", &ctx).await.unwrap().coerce_number(),
        state.get("h3", &ctx).await.unwrap().coerce_number(),
    )
}

/// Deliver one inbound publish the way the live MQTT pipe does: one pipe
/// event per matched subscription, exact matches first.
async fn deliver(f: &Fixture, topic: &str) {
    let subscriptions = vec![
        "sensors/+/temperature".to_string(),
        "sensors/#".to_string(),
        "sensors/room1/temperature".to_string(),
    ];
    let payload = Value::from_json(serde_json::json!({ "topic": topic, "payload": 21.5 }));
    let mut matched: Vec<String> = Vec::new();
    for pattern in subscriptions.iter().filter(|p| !weft_pipes::topic::is_wildcard(p)) {
        if pattern == topic {
            matched.push(pattern.clone());
        }
    }
    for pattern in subscriptions.iter().filter(|p| weft_pipes::topic::is_wildcard(p)) {
        if weft_pipes::topic_matches(pattern, topic) {
            matched.push(pattern.clone());
        }
    }
    for pattern in matched {
        f.runtime
            .handle_pipe_event(weft_pipes::PipeEvent {
                pipe: "broker".to_string(),
                event: pattern,
                data: payload.clone(),
            })
            .await;
    }
}

#[tokio::test]
async fn matching_topic_fires_every_subscriber_exactly_once() {
    let f = fixture(sensors_spec());
    deliver(&f, "sensors/room1/temperature").await;
    assert_eq!(counters(&f).await, (1.0, 1.0, 1.0));
}

#[tokio::test]
async fn non_matching_topic_fires_only_the_tail_wildcard() {
    let f = fixture(sensors_spec());
    deliver(&f, "sensors/room1/humidity").await;
    assert_eq!(counters(&f).await, (0.0, 1.0, 0.0));
}

#[tokio::test]
async fn unrelated_topic_fires_nothing() {
    let f = fixture(sensors_spec());
    deliver(&f, "actuators/room1/valve").await;
    assert_eq!(counters(&f).await, (0.0, 0.0, 0.0));
}
