// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime error handler
//!
//! One instance per runtime, injected into every component (never a
//! global). Routes errors through severity and category filters to
//! per-category callbacks and an optional global sink, optionally queues
//! a `runtime:error` event for the router, then applies the default
//! behavior: log, throw, or silent. Callback failures are logged and
//! never propagate into the runtime.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use weft_core::{ErrorCategory, Severity, Value, WeftError};
use weft_spec::{ErrorBehavior, ErrorPolicyDef};

/// Callback signature: the error, its category, and its severity.
pub type ErrorCallback = Arc<dyn Fn(&WeftError, ErrorCategory, Severity) + Send + Sync>;

/// Queued `runtime:error` emission, drained by the runtime's pump.
#[derive(Debug, Clone)]
pub struct QueuedErrorEvent {
    pub category: ErrorCategory,
    pub severity: Severity,
    pub message: String,
}

pub struct ErrorHandler {
    policy: ErrorPolicyDef,
    callbacks: Mutex<HashMap<ErrorCategory, Vec<ErrorCallback>>>,
    global: Mutex<Option<ErrorCallback>>,
    event_queue: Mutex<Vec<QueuedErrorEvent>>,
}

impl ErrorHandler {
    pub fn new(policy: ErrorPolicyDef) -> Self {
        Self {
            policy,
            callbacks: Mutex::new(HashMap::new()),
            global: Mutex::new(None),
            event_queue: Mutex::new(Vec::new()),
        }
    }

    /// Register a per-category callback; invoked in registration order.
    pub fn on_category(&self, category: ErrorCategory, callback: ErrorCallback) {
        self.callbacks.lock().entry(category).or_default().push(callback);
    }

    /// Set the global sink, invoked after category callbacks.
    pub fn on_error(&self, callback: ErrorCallback) {
        *self.global.lock() = Some(callback);
    }

    /// Route one error. Returns `Err` only when the configured default
    /// behavior is `throw` (the caller decides what a fatal throw means).
    pub fn handle(
        &self,
        err: WeftError,
        category: ErrorCategory,
        severity: Severity,
        context: Option<&str>,
    ) -> Result<(), WeftError> {
        if severity < self.policy.min_severity {
            return Ok(());
        }
        if let Some(allowed) = &self.policy.categories {
            if !allowed.contains(&category) {
                return Ok(());
            }
        }

        // Snapshot sinks so a callback registering or handling re-entrantly
        // cannot deadlock on the registry locks
        let callbacks: Vec<ErrorCallback> =
            self.callbacks.lock().get(&category).cloned().unwrap_or_default();
        for callback in &callbacks {
            // Callback panics would poison the runtime; catch and log
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(&err, category, severity)
            }));
            if result.is_err() {
                tracing::error!(category = category.as_str(), "error callback panicked");
            }
        }
        let global = self.global.lock().clone();
        if let Some(global) = global {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                global(&err, category, severity)
            }));
            if result.is_err() {
                tracing::error!("global error callback panicked");
            }
        }

        if self.policy.emit_events {
            self.event_queue.lock().push(QueuedErrorEvent {
                category,
                severity,
                message: err.to_string(),
            });
        }

        match self.policy.behavior {
            ErrorBehavior::Log => {
                let ctx = context.unwrap_or("");
                match severity {
                    Severity::Debug => {
                        tracing::debug!(category = category.as_str(), ctx, error = %err)
                    }
                    Severity::Info => {
                        tracing::info!(category = category.as_str(), ctx, error = %err)
                    }
                    Severity::Warn => {
                        tracing::warn!(category = category.as_str(), ctx, error = %err)
                    }
                    Severity::Error | Severity::Fatal => {
                        tracing::error!(category = category.as_str(), ctx, error = %err)
                    }
                }
                Ok(())
            }
            ErrorBehavior::Throw => Err(err),
            ErrorBehavior::Silent => Ok(()),
        }
    }

    /// Drain events queued for `runtime:error` emission.
    pub fn drain_events(&self) -> Vec<QueuedErrorEvent> {
        std::mem::take(&mut self.event_queue.lock())
    }

    /// Run a fallible future, converting an error into a `handle()` call.
    /// Returns `None` when the future failed (and the behavior was not
    /// `throw`).
    pub async fn guard<T, F>(
        &self,
        category: ErrorCategory,
        severity: Severity,
        context: &str,
        future: F,
    ) -> Result<Option<T>, WeftError>
    where
        F: Future<Output = Result<T, WeftError>>,
    {
        match future.await {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                self.handle(err, category, severity, Some(context))?;
                Ok(None)
            }
        }
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new(ErrorPolicyDef::default())
    }
}

impl QueuedErrorEvent {
    /// Event payload for the `runtime:error` emission.
    pub fn to_value(&self) -> Value {
        let mut map = indexmap::IndexMap::new();
        map.insert("category".to_string(), Value::String(self.category.as_str().to_string()));
        map.insert("severity".to_string(), Value::String(self.severity.as_str().to_string()));
        map.insert("message".to_string(), Value::String(self.message.clone()));
        Value::Object(map)
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
