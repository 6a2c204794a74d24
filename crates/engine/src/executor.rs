// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action execution
//!
//! One action, a sequence, or a parallel fan-out, threading the mutable
//! per-sequence context. Structured control actions are interpreted here
//! (see `flow.rs`) before the registry is consulted. Per-action policy:
//! a `when` condition gates execution; an `error_handler` flow swallows
//! the failure from the enclosing sequence; otherwise the sequence stops
//! and the dispatcher records the error.

use crate::context::ActionContext;
use crate::registry::{Outcome, Signal};
use crate::runtime::Runtime;
use futures_util::future::BoxFuture;
use weft_core::{format_elapsed_ms, Clock, ErrorCategory, Severity, Value, WeftError};
use weft_spec::{ActionSpec, Condition};

impl<C: Clock> Runtime<C> {
    /// Run an action list in sequence mode. `Abort`/`Return`/`Break`
    /// short-circuit; errors stop the sequence unless the failing action
    /// declared an `error_handler`.
    pub fn run_sequence<'a>(
        &'a self,
        actions: &'a [ActionSpec],
        ctx: &'a mut ActionContext,
        depth: usize,
    ) -> BoxFuture<'a, Result<Outcome, WeftError>> {
        Box::pin(async move {
            let mut last = Outcome::done();
            for action in actions {
                let outcome = self.run_action(action, ctx, depth).await?;
                if !outcome.signal.is_continue() {
                    return Ok(outcome);
                }
                last = outcome;
            }
            Ok(last)
        })
    }

    /// Run one action: `when` gate, control-flow interpretation, registry
    /// dispatch, error policy, and tracing.
    pub fn run_action<'a>(
        &'a self,
        action: &'a ActionSpec,
        ctx: &'a mut ActionContext,
        depth: usize,
    ) -> BoxFuture<'a, Result<Outcome, WeftError>> {
        Box::pin(async move {
            if let Some(when) = &action.when {
                if !self.eval_condition(when, ctx)? {
                    return Ok(Outcome::done());
                }
            }

            let start = std::time::Instant::now();
            let result = self.run_action_inner(action, ctx, depth).await;
            let elapsed = format_elapsed_ms(start.elapsed().as_millis() as u64);
            match &result {
                Ok(_) => tracing::debug!(action = %action.action, %elapsed, "action done"),
                Err(e) => tracing::warn!(action = %action.action, %elapsed, error = %e, "action failed"),
            }

            match result {
                Err(err) => self.apply_error_policy(action, err, ctx, depth).await,
                ok => ok,
            }
        })
    }

    async fn run_action_inner(
        &self,
        action: &ActionSpec,
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Outcome, WeftError> {
        // Structured control actions first; everything else is a handler
        match action.action.as_str() {
            "flow_if" => self.flow_if(action, ctx, depth).await,
            "flow_switch" => self.flow_switch(action, ctx, depth).await,
            "flow_while" => self.flow_while(action, ctx, depth).await,
            "repeat" => self.flow_repeat(action, ctx, depth).await,
            "parallel" => self.flow_parallel(action, ctx, depth).await,
            "batch" => self.flow_batch(action, ctx, depth).await,
            "try" => self.flow_try(action, ctx, depth).await,
            "call_flow" => self.call_flow(action, ctx, depth).await,
            "abort" => {
                let reason = match action.get("reason") {
                    Some(raw) => Some(self.eval_json(raw, ctx)?.to_display_string()),
                    None => None,
                };
                Ok(Outcome::signal(Signal::Abort { reason }))
            }
            "return" => {
                let value = match action.get("value") {
                    Some(raw) => Some(self.eval_json(raw, ctx)?),
                    None => None,
                };
                Ok(Outcome::signal(Signal::Return { value }))
            }
            "break" => Ok(Outcome::signal(Signal::Break)),
            name => {
                let handler = self.registry().get(name)?;
                handler(self, action, ctx).await
            }
        }
    }

    /// On failure: an `error_handler` flow runs with `{error, action_name}`
    /// and the error is swallowed; otherwise it propagates to the caller.
    async fn apply_error_policy(
        &self,
        action: &ActionSpec,
        err: WeftError,
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Outcome, WeftError> {
        let Some(flow_name) = &action.error_handler else { return Err(err) };

        let mut handler_ctx = ctx.fork();
        handler_ctx.set("error", Value::String(err.to_string()));
        handler_ctx.set("action_name", Value::String(action.action.clone()));

        match self.run_flow_by_name(flow_name, &mut handler_ctx, depth).await {
            Ok(_) => {}
            Err(handler_err) => {
                // The error handler failing must not replace the policy:
                // record it and still swallow the original
                self.errors().handle(
                    handler_err,
                    ErrorCategory::Action,
                    Severity::Error,
                    Some(flow_name),
                )?;
            }
        }
        Ok(Outcome::done())
    }

    /// Fan out branches, one forked context each; await all, merge the
    /// branch writes back in declaration order, report every error (none
    /// masked) and propagate the first.
    pub(crate) async fn run_branches(
        &self,
        branches: &[ActionSpec],
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Outcome, WeftError> {
        let mut forks: Vec<ActionContext> = branches.iter().map(|_| ctx.fork()).collect();
        let futures = branches
            .iter()
            .zip(forks.iter_mut())
            .map(|(action, fork)| self.run_action(action, fork, depth));
        let results = futures_util::future::join_all(futures).await;

        let mut first_error: Option<WeftError> = None;
        let mut signal = Signal::Continue;
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(outcome) => {
                    ctx.merge(&forks[i]);
                    if signal.is_continue() && !outcome.signal.is_continue() {
                        signal = outcome.signal;
                    }
                }
                Err(err) => {
                    self.errors().handle(
                        err.clone(),
                        ErrorCategory::Action,
                        Severity::Error,
                        Some(&branches[i].action),
                    )?;
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(Outcome::signal(signal)),
        }
    }

    // --- evaluation helpers ---

    /// Evaluate a condition tree; every variant is evaluated, there is no
    /// "object means true" shortcut.
    pub fn eval_condition(&self, cond: &Condition, ctx: &ActionContext) -> Result<bool, WeftError> {
        Ok(match cond {
            Condition::Str(source) | Condition::Expr { expr: source } => {
                self.evaluator().evaluate_condition(source, ctx)?
            }
            Condition::All { all } => {
                for branch in all {
                    if !self.eval_condition(branch, ctx)? {
                        return Ok(false);
                    }
                }
                true
            }
            Condition::Any { any } => {
                for branch in any {
                    if self.eval_condition(branch, ctx)? {
                        return Ok(true);
                    }
                }
                false
            }
            Condition::Not { not } => !self.eval_condition(not, ctx)?,
        })
    }

    /// Deep-evaluate a raw spec value: strings are templates, containers
    /// recurse, scalars pass through.
    pub fn eval_json(
        &self,
        raw: &serde_json::Value,
        ctx: &ActionContext,
    ) -> Result<Value, WeftError> {
        Ok(match raw {
            serde_json::Value::String(template) => self.evaluator().evaluate_template(template, ctx)?,
            serde_json::Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval_json(item, ctx)?);
                }
                Value::Array(out)
            }
            serde_json::Value::Object(entries) => {
                let mut out = indexmap::IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    out.insert(key.clone(), self.eval_json(value, ctx)?);
                }
                Value::Object(out)
            }
            other => Value::from_json(other.clone()),
        })
    }

    /// Evaluated argument; absent fields are null.
    pub fn eval_arg(
        &self,
        action: &ActionSpec,
        key: &str,
        ctx: &ActionContext,
    ) -> Result<Value, WeftError> {
        match action.get(key) {
            Some(raw) => self.eval_json(raw, ctx),
            None => Ok(Value::Null),
        }
    }

    /// Evaluated argument that must produce a non-empty string.
    pub fn required_str(
        &self,
        action: &ActionSpec,
        key: &str,
        ctx: &ActionContext,
    ) -> Result<String, WeftError> {
        let value = self.eval_arg(action, key, ctx)?;
        let text = value.to_display_string();
        if text.is_empty() {
            return Err(WeftError::validation(format!(
                "action '{}' requires '{key}'",
                action.action
            )));
        }
        Ok(text)
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
