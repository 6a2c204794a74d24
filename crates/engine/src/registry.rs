// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action registry: name → handler
//!
//! A handler is an async function over the runtime, the action's raw
//! record, and the mutable per-sequence context. The structured control
//! actions (`flow_if`, `batch`, …) are interpreted by the executor before
//! the registry is consulted; everything else dispatches here. Unknown
//! action tags fail with a validation error. The table is read-mostly:
//! handlers are added at startup, never replaced at run time.

use crate::context::ActionContext;
use crate::runtime::Runtime;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use weft_core::{Clock, Value, WeftError};
use weft_spec::ActionSpec;

/// Control signal returned by an action.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Signal {
    #[default]
    Continue,
    Break,
    Abort {
        reason: Option<String>,
    },
    Return {
        value: Option<Value>,
    },
}

impl Signal {
    pub fn is_continue(&self) -> bool {
        matches!(self, Signal::Continue)
    }
}

/// Handler result: optional data plus a control signal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outcome {
    pub value: Option<Value>,
    pub signal: Signal,
}

impl Outcome {
    pub fn done() -> Self {
        Self::default()
    }

    pub fn value(value: Value) -> Self {
        Self { value: Some(value), signal: Signal::Continue }
    }

    pub fn signal(signal: Signal) -> Self {
        Self { value: None, signal }
    }
}

/// A registered handler; `handler!` adapts plain async fns.
pub type HandlerFn<C> = for<'a> fn(
    &'a Runtime<C>,
    &'a ActionSpec,
    &'a mut ActionContext,
) -> BoxFuture<'a, Result<Outcome, WeftError>>;

/// Adapt an async fn path into a [`HandlerFn`] through a boxing
/// trampoline (the generic parameter is inferred at the registration
/// site).
#[macro_export]
macro_rules! handler {
    ($path:path) => {{
        fn trampoline<'a, Cx: weft_core::Clock>(
            runtime: &'a $crate::runtime::Runtime<Cx>,
            action: &'a weft_spec::ActionSpec,
            ctx: &'a mut $crate::context::ActionContext,
        ) -> futures_util::future::BoxFuture<
            'a,
            Result<$crate::registry::Outcome, weft_core::WeftError>,
        > {
            Box::pin($path(runtime, action, ctx))
        }
        trampoline
    }};
}

/// The name → handler table.
pub struct ActionRegistry<C: Clock> {
    handlers: HashMap<String, HandlerFn<C>>,
}

impl<C: Clock> Default for ActionRegistry<C> {
    fn default() -> Self {
        Self { handlers: HashMap::new() }
    }
}

impl<C: Clock> ActionRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, handler: HandlerFn<C>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Result<HandlerFn<C>, WeftError> {
        self.handlers
            .get(name)
            .copied()
            .ok_or_else(|| WeftError::validation(format!("unknown action '{name}'")))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
