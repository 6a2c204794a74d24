// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipe reconnection backoff (spec scenario 6)
//!
//! A TCP pipe pointed at the discard port cannot connect; the reconnect
//! loop must make exactly `max_attempts` delayed attempts at the
//! configured spacing and report exhaustion once.

use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use weft_pipes::{Pipe, PipeEvent, PipeState};

fn unreachable_def() -> weft_spec::TcpPipeDef {
    serde_json::from_value(serde_json::json!({
        "host": "127.0.0.1",
        "port": 9,
        "reconnect": { "delay": "50ms", "max_attempts": 3 },
    }))
    .unwrap()
}

async fn next_event(rx: &mut mpsc::Receiver<PipeEvent>) -> Option<PipeEvent> {
    tokio::time::timeout(Duration::from_secs(10), rx.recv()).await.ok().flatten()
}

#[tokio::test]
async fn three_attempts_with_spacing_then_reconnect_failed_once() {
    let (tx, mut rx) = mpsc::channel(64);
    let pipe = weft_pipes::tcp::TcpPipe::new("doomed", unreachable_def(), tx);

    let started = Instant::now();
    pipe.connect().await.unwrap();

    let mut errors = 0;
    let mut failures = 0;
    while let Some(event) = next_event(&mut rx).await {
        match event.event.as_str() {
            "error" => errors += 1,
            "reconnect_failed" => {
                failures += 1;
                break;
            }
            other => panic!("unexpected event '{other}'"),
        }
    }
    // Initial attempt plus three delayed retries, each erroring
    assert_eq!(errors, 4);
    assert_eq!(failures, 1);
    // Three 50ms gaps passed before exhaustion
    assert!(started.elapsed() >= Duration::from_millis(150));

    // The fourth delayed attempt does not occur and exhaustion reports
    // exactly once
    assert!(
        tokio::time::timeout(Duration::from_millis(300), rx.recv()).await.is_err(),
        "no further events after reconnect_failed"
    );
    assert_eq!(pipe.state(), PipeState::Disconnected);
}

#[tokio::test]
async fn explicit_connect_resets_the_attempt_budget() {
    let (tx, mut rx) = mpsc::channel(64);
    let pipe = weft_pipes::tcp::TcpPipe::new("doomed", unreachable_def(), tx);

    pipe.connect().await.unwrap();
    // Exhaust the first budget
    loop {
        match next_event(&mut rx).await {
            Some(event) if event.event == "reconnect_failed" => break,
            Some(_) => {}
            None => panic!("pipe went silent before exhausting"),
        }
    }

    // A fresh explicit connect starts a new cycle ending in another
    // exhaustion report
    pipe.connect().await.unwrap();
    let mut saw_failure = false;
    while let Some(event) = next_event(&mut rx).await {
        if event.event == "reconnect_failed" {
            saw_failure = true;
            break;
        }
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn disconnect_cancels_the_reconnect_loop() {
    let (tx, mut rx) = mpsc::channel(64);
    let pipe = weft_pipes::tcp::TcpPipe::new("doomed", unreachable_def(), tx);
    pipe.connect().await.unwrap();

    // Let at least the first failure land, then tear down
    let _ = next_event(&mut rx).await;
    pipe.disconnect().await;
    assert_eq!(pipe.state(), PipeState::Closed);

    // The loop stops: no exhaustion report arrives afterwards
    let mut saw_failure = false;
    while let Ok(Some(event)) =
        tokio::time::timeout(Duration::from_millis(300), rx.recv()).await
    {
        if event.event == "reconnect_failed" {
            saw_failure = true;
        }
    }
    assert!(!saw_failure, "disconnect must cancel pending reconnects");
}
