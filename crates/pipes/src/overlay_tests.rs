// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn first_matching_event_resolves_the_request() {
    let overlay = RequestOverlay::new();
    let rx = overlay.register("pong");
    assert!(overlay.resolve("pong", &Value::Number(1.0)));
    let got = overlay.await_response(rx, Duration::from_secs(1)).await.unwrap();
    assert_eq!(got, Value::Number(1.0));
}

#[tokio::test]
async fn non_matching_events_do_not_resolve() {
    let overlay = RequestOverlay::new();
    let _rx = overlay.register("pong");
    assert!(!overlay.resolve("other", &Value::Number(1.0)));
    assert_eq!(overlay.pending(), 1);
}

#[tokio::test]
async fn timeout_yields_request_timeout() {
    let overlay = RequestOverlay::new();
    let rx = overlay.register("pong");
    let err = overlay.await_response(rx, Duration::from_millis(10)).await.unwrap_err();
    assert!(matches!(err, WeftError::RequestTimeout { .. }));
}

#[tokio::test]
async fn waiters_resolve_oldest_first() {
    let overlay = RequestOverlay::new();
    let rx1 = overlay.register("data");
    let rx2 = overlay.register("data");

    overlay.resolve("data", &Value::Number(1.0));
    overlay.resolve("data", &Value::Number(2.0));

    assert_eq!(rx1.await.unwrap(), Value::Number(1.0));
    assert_eq!(rx2.await.unwrap(), Value::Number(2.0));
}

#[tokio::test]
async fn abandoned_waiters_are_skipped() {
    let overlay = RequestOverlay::new();
    let rx1 = overlay.register("data");
    drop(rx1);
    let rx2 = overlay.register("data");
    assert!(overlay.resolve("data", &Value::Bool(true)));
    assert_eq!(rx2.await.unwrap(), Value::Bool(true));
}

#[tokio::test]
async fn clear_drops_everything() {
    let overlay = RequestOverlay::new();
    let rx = overlay.register("data");
    overlay.clear();
    assert_eq!(overlay.pending(), 0);
    let err = overlay.await_response(rx, Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, WeftError::Transport(_)));
}
