// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response overlay over message-stream transports
//!
//! A request registers a one-shot waiter keyed by a logical response event
//! (for TCP, the `data` event: "next frame wins"). The first matching
//! inbound occurrence resolves the oldest waiter; waiting past the timeout
//! fails with `RequestTimeout`. Correct only for strictly request-response
//! protocols; concurrent requests on the same response event race, and
//! callers needing more must demultiplex with a correlation id one layer
//! up.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::oneshot;
use weft_core::{Value, WeftError};

#[derive(Default)]
pub struct RequestOverlay {
    waiters: Mutex<HashMap<String, VecDeque<oneshot::Sender<Value>>>>,
}

impl RequestOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for the next occurrence of `event`.
    pub fn register(&self, event: &str) -> oneshot::Receiver<Value> {
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().entry(event.to_string()).or_default().push_back(tx);
        rx
    }

    /// Resolve the oldest live waiter for `event`; returns whether one was
    /// resolved.
    pub fn resolve(&self, event: &str, value: &Value) -> bool {
        let mut waiters = self.waiters.lock();
        let Some(queue) = waiters.get_mut(event) else { return false };
        while let Some(tx) = queue.pop_front() {
            // A closed receiver means the requester gave up (timeout); try
            // the next one
            if tx.send(value.clone()).is_ok() {
                if queue.is_empty() {
                    waiters.remove(event);
                }
                return true;
            }
        }
        waiters.remove(event);
        false
    }

    /// Await a registered waiter with a deadline.
    pub async fn await_response(
        &self,
        rx: oneshot::Receiver<Value>,
        timeout: Duration,
    ) -> Result<Value, WeftError> {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(WeftError::Transport("pipe dropped before responding".into())),
            Err(_) => Err(WeftError::RequestTimeout { waited_ms: timeout.as_millis() as u64 }),
        }
    }

    /// Drop every pending waiter (connection teardown).
    pub fn clear(&self) {
        self.waiters.lock().clear();
    }

    pub fn pending(&self) -> usize {
        self.waiters.lock().values().map(VecDeque::len).sum()
    }
}

#[cfg(test)]
#[path = "overlay_tests.rs"]
mod tests;
