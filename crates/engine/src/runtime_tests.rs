// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::rig;
use std::time::Duration;
use weft_core::{ScopeContext, Value};

#[tokio::test]
async fn emit_runs_handlers_in_order_with_trigger_context() {
    let r = rig(serde_json::json!({
        "state": {
            "variables": { "joins": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "member_join",
              "actions": [ { "action": "increment", "name": "joins", "by": 1 } ] },
            { "event": "member_join",
              "actions": [ { "action": "send_message", "channel": "welcome",
                             "content": "hi ${user.name}" } ] },
        ],
    }));

    r.runtime
        .emit("member_join", Value::from_json(serde_json::json!({
            "user": { "id": "U1", "name": "ada" },
        })))
        .await;

    let joins = r.runtime.state().get("joins", &ScopeContext::new()).await.unwrap();
    assert_eq!(joins, Value::Number(1.0));
    let calls = r.platform.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].1.get_member("payload").get_member("content"),
        Value::String("hi ada".into())
    );
}

#[tokio::test]
async fn when_condition_filters_handlers() {
    let r = rig(serde_json::json!({
        "events": [
            { "event": "msg", "when": "${content} == 'ping'",
              "actions": [ { "action": "send_message", "channel": "c", "content": "pong" } ] },
        ],
    }));

    r.runtime.emit("msg", Value::from_json(serde_json::json!({ "content": "other" }))).await;
    assert!(r.platform.calls().is_empty());

    r.runtime.emit("msg", Value::from_json(serde_json::json!({ "content": "ping" }))).await;
    assert_eq!(r.platform.calls().len(), 1);
}

#[tokio::test]
async fn once_handler_runs_exactly_once() {
    let r = rig(serde_json::json!({
        "state": {
            "variables": { "fired": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "y", "once": true,
              "actions": [ { "action": "increment", "name": "fired", "by": 1 } ] },
        ],
    }));

    r.runtime.emit("y", Value::Null).await;
    r.runtime.emit("y", Value::Null).await;

    let fired = r.runtime.state().get("fired", &ScopeContext::new()).await.unwrap();
    assert_eq!(fired, Value::Number(1.0));
}

#[tokio::test]
async fn debounced_burst_collapses_to_one_run_with_latest_context() {
    let r = rig(serde_json::json!({
        "state": {
            "variables": { "bursts": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "x", "debounce": "100ms",
              "actions": [
                  { "action": "increment", "name": "bursts", "by": 1 },
                  { "action": "set", "name": "unused", "value": "${n}" },
              ] },
        ],
    }));

    for i in 0..10 {
        r.runtime
            .emit("x", Value::from_json(serde_json::json!({ "n": i })))
            .await;
        r.clock.advance(Duration::from_millis(10));
    }
    // Inside the quiet window: nothing ran yet
    r.runtime.pump().await;
    let bursts = r.runtime.state().get("bursts", &ScopeContext::new()).await.unwrap();
    assert_eq!(bursts, Value::Number(0.0));

    // 100ms after the last emit
    r.clock.advance(Duration::from_millis(100));
    r.runtime.pump().await;
    let bursts = r.runtime.state().get("bursts", &ScopeContext::new()).await.unwrap();
    assert_eq!(bursts, Value::Number(1.0));

    // No further pending execution
    r.clock.advance(Duration::from_millis(500));
    r.runtime.pump().await;
    let bursts = r.runtime.state().get("bursts", &ScopeContext::new()).await.unwrap();
    assert_eq!(bursts, Value::Number(1.0));
}

#[tokio::test]
async fn throttle_first_wins_within_the_window() {
    let r = rig(serde_json::json!({
        "state": {
            "variables": { "runs": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "t", "throttle": "1s",
              "actions": [ { "action": "increment", "name": "runs", "by": 1 } ] },
        ],
    }));

    r.runtime.emit("t", Value::Null).await;
    r.clock.advance(Duration::from_millis(500));
    r.runtime.emit("t", Value::Null).await;
    let runs = r.runtime.state().get("runs", &ScopeContext::new()).await.unwrap();
    assert_eq!(runs, Value::Number(1.0));

    r.clock.advance(Duration::from_millis(500));
    r.runtime.emit("t", Value::Null).await;
    let runs = r.runtime.state().get("runs", &ScopeContext::new()).await.unwrap();
    assert_eq!(runs, Value::Number(2.0));
}

#[tokio::test]
async fn handler_failure_does_not_stop_later_handlers() {
    let r = rig(serde_json::json!({
        "state": {
            "variables": { "ok": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "e", "actions": [ { "action": "no_such_action" } ] },
            { "event": "e", "actions": [ { "action": "increment", "name": "ok", "by": 1 } ] },
        ],
    }));

    r.runtime.emit("e", Value::Null).await;
    let ok = r.runtime.state().get("ok", &ScopeContext::new()).await.unwrap();
    assert_eq!(ok, Value::Number(1.0));
}

#[tokio::test]
async fn command_dispatch_with_args_and_subcommands() {
    let r = rig(serde_json::json!({
        "commands": {
            "rank": {
                "actions": [ { "action": "reply", "content": "rank of ${args.user}" } ],
            },
            "tags": {
                "subcommands": {
                    "add": { "actions": [ { "action": "reply", "content": "added ${args.name}" } ] },
                },
            },
        },
    }));

    r.runtime
        .dispatch_command(
            &["rank"],
            Value::from_json(serde_json::json!({ "user": "U1" })),
            Value::Null,
        )
        .await
        .unwrap();
    r.runtime
        .dispatch_command(
            &["tags", "add"],
            Value::from_json(serde_json::json!({ "name": "rust" })),
            Value::Null,
        )
        .await
        .unwrap();

    let calls = r.platform.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0].1.get_member("content"),
        Value::String("rank of U1".into())
    );
    assert_eq!(
        calls[1].1.get_member("content"),
        Value::String("added rust".into())
    );

    let err = r.runtime.dispatch_command(&["nope"], Value::Null, Value::Null).await.unwrap_err();
    assert!(matches!(err, weft_core::WeftError::Validation(_)));
}

#[tokio::test]
async fn command_access_rules_check_users_and_roles() {
    let r = rig(serde_json::json!({
        "permissions": {
            "moderator": { "level": 50, "roles": ["R_MOD"], "users": ["U_OWNER"] },
        },
        "commands": {
            "purge": {
                "access": "moderator",
                "actions": [ { "action": "reply", "content": "purged" } ],
            },
        },
    }));

    // Listed user passes
    r.runtime
        .dispatch_command(
            &["purge"],
            Value::Null,
            Value::from_json(serde_json::json!({ "user": { "id": "U_OWNER" } })),
        )
        .await
        .unwrap();

    // Role carrier passes
    r.runtime
        .dispatch_command(
            &["purge"],
            Value::Null,
            Value::from_json(serde_json::json!({
                "user": { "id": "U2" },
                "member": { "roles": ["R_MOD"] },
            })),
        )
        .await
        .unwrap();

    // Everyone else is denied before any action runs
    let calls_before = r.platform.calls().len();
    let err = r
        .runtime
        .dispatch_command(
            &["purge"],
            Value::Null,
            Value::from_json(serde_json::json!({ "user": { "id": "U3" } })),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("access denied"));
    assert_eq!(r.platform.calls().len(), calls_before);
}

#[tokio::test]
async fn timer_actions_schedule_and_cancel_through_the_scheduler() {
    let r = rig(serde_json::json!({
        "state": {
            "variables": { "reminded": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "remind_due",
              "actions": [ { "action": "increment", "name": "reminded", "by": 1 } ] },
            { "event": "start",
              "actions": [ { "action": "create_timer", "id": "r1", "duration": "5s",
                             "event": "remind_due", "data": { "what": "tea" } } ] },
        ],
    }));

    r.runtime.emit("start", Value::Null).await;
    r.runtime.pump().await;
    let reminded = r.runtime.state().get("reminded", &ScopeContext::new()).await.unwrap();
    assert_eq!(reminded, Value::Number(0.0));

    r.clock.advance(Duration::from_secs(5));
    r.runtime.pump().await;
    let reminded = r.runtime.state().get("reminded", &ScopeContext::new()).await.unwrap();
    assert_eq!(reminded, Value::Number(1.0));

    // One-shot: does not fire again
    r.clock.advance(Duration::from_secs(60));
    r.runtime.pump().await;
    let reminded = r.runtime.state().get("reminded", &ScopeContext::new()).await.unwrap();
    assert_eq!(reminded, Value::Number(1.0));
}

#[tokio::test]
async fn cancelled_timer_never_fires() {
    let r = rig(serde_json::json!({
        "state": {
            "variables": { "fired": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "due", "actions": [ { "action": "increment", "name": "fired", "by": 1 } ] },
        ],
    }));
    r.runtime.set_timer("t1".into(), Duration::from_secs(1), "due".into(), Value::Null);
    assert!(r.runtime.cancel_timer("t1"));
    r.clock.advance(Duration::from_secs(5));
    r.runtime.pump().await;
    let fired = r.runtime.state().get("fired", &ScopeContext::new()).await.unwrap();
    assert_eq!(fired, Value::Number(0.0));
}

#[tokio::test]
async fn cron_job_guard_variable_pattern_executes_once_per_firing() {
    // Guard-and-skip: the job sets a guard and skips when it is already
    // set, so overlapping fires cannot double-run the body
    let r = rig(serde_json::json!({
        "state": {
            "variables": {
                "running": { "type": "bool", "scope": "global", "default": false },
                "work": { "type": "number", "scope": "global", "default": 0 },
            },
        },
        "scheduler": {
            "jobs": [
                { "name": "tick", "cron": "0 * * * * *",
                  "actions": [
                      { "action": "state_get", "name": "running" },
                      { "action": "abort", "when": "${running}" },
                      { "action": "set", "name": "running", "value": true },
                      { "action": "increment", "name": "work", "by": 1 },
                      { "action": "set", "name": "running", "value": false },
                  ] },
            ],
        },
    }));

    // Jump the clock past one minute boundary (epoch starts at 1_000_000)
    r.clock.advance(Duration::from_secs(61));
    r.runtime.pump().await;
    // Injected clock jump across many boundaries still fires exactly once
    r.clock.advance(Duration::from_secs(600));
    r.runtime.pump().await;

    let work = r.runtime.state().get("work", &ScopeContext::new()).await.unwrap();
    assert_eq!(work, Value::Number(2.0));
}

#[tokio::test]
async fn runtime_error_events_are_emitted_when_configured() {
    let r = rig(serde_json::json!({
        "errors": { "emit_events": true, "behavior": "silent" },
        "state": {
            "variables": { "errors_seen": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "runtime:error",
              "actions": [ { "action": "increment", "name": "errors_seen", "by": 1 } ] },
            { "event": "boom", "actions": [ { "action": "no_such_action" } ] },
        ],
    }));

    r.runtime.emit("boom", Value::Null).await;
    r.runtime.pump().await;

    let seen = r.runtime.state().get("errors_seen", &ScopeContext::new()).await.unwrap();
    assert_eq!(seen, Value::Number(1.0));
}

#[tokio::test]
async fn pipe_events_route_to_pipe_scoped_handlers() {
    let r = rig(serde_json::json!({
        "state": {
            "variables": { "frames": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "pipe:telemetry:message",
              "actions": [ { "action": "increment", "name": "frames", "by": 1 } ] },
        ],
    }));

    r.runtime
        .handle_pipe_event(weft_pipes::PipeEvent {
            pipe: "telemetry".to_string(),
            event: "message".to_string(),
            data: Value::String("payload".into()),
        })
        .await;

    let frames = r.runtime.state().get("frames", &ScopeContext::new()).await.unwrap();
    assert_eq!(frames, Value::Number(1.0));
}

#[tokio::test]
async fn hot_swap_rebuilds_handlers_and_jobs_as_a_unit() {
    let r = rig(serde_json::json!({
        "state": {
            "variables": { "n": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "e", "actions": [ { "action": "increment", "name": "n", "by": 1 } ] },
        ],
    }));

    r.runtime.emit("e", Value::Null).await;

    let new_spec = weft_spec::BotSpec::from_value(serde_json::json!({
        "state": {
            "variables": { "n": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "e", "actions": [ { "action": "increment", "name": "n", "by": 10 } ] },
        ],
    }))
    .unwrap();
    r.runtime.hot_swap(new_spec).await.unwrap();

    r.runtime.emit("e", Value::Null).await;
    let n = r.runtime.state().get("n", &ScopeContext::new()).await.unwrap();
    // 1 from the old handler, 10 from the new
    assert_eq!(n, Value::Number(11.0));
}

#[tokio::test]
async fn once_handler_runs_again_after_hot_swap() {
    let doc = serde_json::json!({
        "state": {
            "variables": { "n": { "type": "number", "scope": "global", "default": 0 } },
        },
        "events": [
            { "event": "y", "once": true,
              "actions": [ { "action": "increment", "name": "n", "by": 1 } ] },
        ],
    });
    let r = rig(doc.clone());

    r.runtime.emit("y", Value::Null).await;
    r.runtime.emit("y", Value::Null).await;
    r.runtime.hot_swap(weft_spec::BotSpec::from_value(doc).unwrap()).await.unwrap();
    r.runtime.emit("y", Value::Null).await;

    let n = r.runtime.state().get("n", &ScopeContext::new()).await.unwrap();
    assert_eq!(n, Value::Number(2.0));
}

#[tokio::test]
async fn metrics_observe_emits_and_commands() {
    let r = rig(serde_json::json!({
        "commands": { "hi": { "actions": [ { "action": "reply", "content": "o/" } ] } },
        "events": [ { "event": "e", "actions": [] } ],
    }));
    r.runtime.emit("e", Value::Null).await;
    r.runtime.dispatch_command(&["hi"], Value::Null, Value::Null).await.unwrap();

    assert_eq!(r.runtime.metrics().get("weft_events_total", &[]), 1.0);
    assert_eq!(
        r.runtime.metrics().get("weft_commands_total", &[("command", "hi")]),
        1.0
    );
    let text = r.runtime.metrics().export_prometheus();
    assert!(text.contains("weft_events_total 1"));
}

#[tokio::test]
async fn close_clears_router_and_cache() {
    let r = rig(serde_json::json!({
        "events": [ { "event": "e", "debounce": "1s", "actions": [] } ],
    }));
    r.runtime.emit("e", Value::Null).await;
    assert!(r.runtime.next_deadline().is_some());

    r.runtime.close().await;
    assert!(r.runtime.next_deadline().is_none());
    assert!(r.runtime.shutdown_token().is_cancelled());
}
