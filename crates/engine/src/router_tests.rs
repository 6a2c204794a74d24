// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weft_core::Value;

fn handler(doc: serde_json::Value) -> EventHandlerDef {
    serde_json::from_value(doc).unwrap()
}

fn log_handler(event: &str, marker: &str) -> EventHandlerDef {
    handler(serde_json::json!({
        "event": event,
        "actions": [ { "action": "log", "message": marker } ],
    }))
}

fn always(_c: &Condition, _ctx: &ActionContext) -> bool {
    true
}

#[test]
fn dispatch_in_registration_order() {
    let mut router = Router::new();
    router.register(log_handler("x", "first")).unwrap();
    router.register(log_handler("y", "other")).unwrap();
    router.register(log_handler("x", "second")).unwrap();

    let items = router.gate("x", &ActionContext::new(), Instant::now(), always);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].actions.0[0].get_str("message"), Some("first"));
    assert_eq!(items[1].actions.0[0].get_str("message"), Some("second"));

    assert!(router.gate("unknown", &ActionContext::new(), Instant::now(), always).is_empty());
}

#[test]
fn when_gates_dispatch() {
    let mut router = Router::new();
    router
        .register(handler(serde_json::json!({
            "event": "x", "when": "${go}", "actions": [ { "action": "log", "message": "m" } ],
        })))
        .unwrap();

    let items = router.gate("x", &ActionContext::new(), Instant::now(), |_, _| false);
    assert!(items.is_empty());
    let items = router.gate("x", &ActionContext::new(), Instant::now(), |_, _| true);
    assert_eq!(items.len(), 1);
}

#[test]
fn once_fires_at_most_once_even_reentrantly() {
    let mut router = Router::new();
    router
        .register(handler(serde_json::json!({
            "event": "y", "once": true, "actions": [ { "action": "log", "message": "m" } ],
        })))
        .unwrap();

    let now = Instant::now();
    assert_eq!(router.gate("y", &ActionContext::new(), now, always).len(), 1);
    assert_eq!(router.gate("y", &ActionContext::new(), now, always).len(), 0);
    assert_eq!(router.active_count("y"), 0);
}

#[test]
fn once_is_consumed_before_running_not_after() {
    let mut router = Router::new();
    router
        .register(handler(serde_json::json!({
            "event": "y", "once": true, "actions": [ { "action": "emit", "event": "y" } ],
        })))
        .unwrap();
    // First gate deactivates; a re-entrant gate during "execution" yields
    // nothing
    let first = router.gate("y", &ActionContext::new(), Instant::now(), always);
    assert_eq!(first.len(), 1);
    let reentrant = router.gate("y", &ActionContext::new(), Instant::now(), always);
    assert!(reentrant.is_empty());
}

#[test]
fn throttle_first_wins_in_window() {
    let mut router = Router::new();
    router
        .register(handler(serde_json::json!({
            "event": "t", "throttle": "100ms",
            "actions": [ { "action": "log", "message": "m" } ],
        })))
        .unwrap();

    let t0 = Instant::now();
    assert_eq!(router.gate("t", &ActionContext::new(), t0, always).len(), 1);
    // Within the window: dropped
    assert_eq!(
        router.gate("t", &ActionContext::new(), t0 + Duration::from_millis(50), always).len(),
        0
    );
    // Past the window: fires again
    assert_eq!(
        router.gate("t", &ActionContext::new(), t0 + Duration::from_millis(100), always).len(),
        1
    );
}

#[test]
fn debounce_collapses_bursts_and_keeps_latest_context() {
    let mut router = Router::new();
    router
        .register(handler(serde_json::json!({
            "event": "d", "debounce": "100ms",
            "actions": [ { "action": "log", "message": "m" } ],
        })))
        .unwrap();

    let t0 = Instant::now();
    for i in 0..10 {
        let mut ctx = ActionContext::new();
        ctx.set("n", Value::Number(i as f64));
        let items = router.gate("d", &ctx, t0 + Duration::from_millis(i * 10), always);
        // Debounced emits never dispatch inline
        assert!(items.is_empty());
    }

    // Quiet period measured from the last emit (t0 + 90ms)
    assert!(router.fired_debounces(t0 + Duration::from_millis(150)).is_empty());

    let deadline = router.next_debounce_deadline().unwrap();
    assert_eq!(deadline, t0 + Duration::from_millis(190));

    let fired = router.fired_debounces(t0 + Duration::from_millis(190));
    assert_eq!(fired.len(), 1);
    // The captured context is the latest emit's
    assert_eq!(fired[0].ctx.get("n"), Some(&Value::Number(9.0)));

    // One-shot: nothing further pending
    assert!(router.fired_debounces(t0 + Duration::from_millis(500)).is_empty());
    assert!(router.next_debounce_deadline().is_none());
}

#[test]
fn clear_cancels_pending_debounces() {
    let mut router = Router::new();
    router
        .register(handler(serde_json::json!({
            "event": "d", "debounce": "50ms", "actions": [],
        })))
        .unwrap();
    let t0 = Instant::now();
    router.gate("d", &ActionContext::new(), t0, always);
    assert!(router.next_debounce_deadline().is_some());

    router.clear();
    assert!(router.next_debounce_deadline().is_none());
    assert!(router.fired_debounces(t0 + Duration::from_secs(1)).is_empty());
    assert_eq!(router.handler_count("d"), 0);
}

#[test]
fn event_cap_is_enforced() {
    let mut router = Router::with_event_cap(2);
    router.register(log_handler("x", "1")).unwrap();
    router.register(log_handler("x", "2")).unwrap();
    let err = router.register(log_handler("x", "3")).unwrap_err();
    assert!(matches!(err, WeftError::Validation(_)));
    // Other events are unaffected
    router.register(log_handler("y", "ok")).unwrap();
}

#[test]
fn conflicting_timing_gates_rejected_at_registration() {
    let mut router = Router::new();
    let err = router
        .register(handler(serde_json::json!({
            "event": "x", "debounce": "1s", "throttle": "1s", "actions": [],
        })))
        .unwrap_err();
    assert!(matches!(err, WeftError::Validation(_)));
}
