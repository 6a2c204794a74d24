// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent counter arithmetic stays exact (spec scenario 1)

use crate::specs::prelude::*;
use std::sync::Arc;
use weft_core::{ScopeContext, Value};

fn xp_spec() -> serde_json::Value {
    serde_json::json!({
        "state": {
            "variables": { "xp": { "type": "number", "scope": "guild", "default": 0 } },
        },
    })
}

#[tokio::test]
async fn one_hundred_concurrent_increments_sum_to_one_hundred() {
    let f = fixture(xp_spec());
    let state = f.runtime.state();
    let ctx = ScopeContext::new().guild("G");

    let mut handles = Vec::new();
    for _ in 0..100 {
        let state = Arc::clone(&state);
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            state.increment("xp", 1.0, &ctx).await.unwrap()
        }));
    }
    let mut returns = Vec::new();
    for handle in handles {
        returns.push(handle.await.unwrap() as i64);
    }

    assert_eq!(state.get("xp", &ctx).await.unwrap(), Value::Number(100.0));
    // The hundred return values are exactly the prefix sums 1..=100
    returns.sort_unstable();
    assert_eq!(returns, (1..=100).collect::<Vec<i64>>());
}

#[tokio::test]
async fn increments_through_the_action_layer_race_cleanly() {
    let f = fixture(serde_json::json!({
        "state": {
            "variables": { "xp": { "type": "number", "scope": "guild", "default": 0 } },
        },
        "events": [
            { "event": "earn",
              "actions": [ { "action": "increment", "name": "xp", "by": 1 } ] },
        ],
    }));

    let payload = Value::from_json(serde_json::json!({ "guildId": "G" }));
    for _ in 0..25 {
        f.runtime.emit("earn", payload.clone()).await;
    }

    let ctx = ScopeContext::new().guild("G");
    assert_eq!(
        f.runtime.state().get("xp", &ctx).await.unwrap(),
        Value::Number(25.0)
    );
}
