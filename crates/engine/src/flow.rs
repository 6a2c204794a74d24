// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured control-flow actions
//!
//! `flow_if`, `flow_switch`, `flow_while`, `repeat`, `parallel`, `batch`,
//! `try`, `call_flow`, plus the signal emitters `abort` / `return` /
//! `break` handled in the executor. Branch bodies are deferred: they are
//! raw action lists evaluated only when their branch runs.

use crate::context::ActionContext;
use crate::registry::{Outcome, Signal};
use crate::runtime::Runtime;
use weft_core::{Clock, RuntimeErrorKind, Value, WeftError};
use weft_spec::{ActionSpec, Actions, Condition};

fn actions_field(action: &ActionSpec, key: &str) -> Result<Option<Actions>, WeftError> {
    match action.get(key) {
        None => Ok(None),
        Some(raw) => serde_json::from_value(raw.clone()).map(Some).map_err(|e| {
            WeftError::validation(format!("action '{}': bad '{key}': {e}", action.action))
        }),
    }
}

fn condition_field(action: &ActionSpec, key: &str) -> Result<Condition, WeftError> {
    let raw = action.get(key).ok_or_else(|| {
        WeftError::validation(format!("action '{}' requires '{key}'", action.action))
    })?;
    serde_json::from_value(raw.clone()).map_err(|e| {
        WeftError::validation(format!("action '{}': bad '{key}': {e}", action.action))
    })
}

impl<C: Clock> Runtime<C> {
    /// `flow_if { cond, then, else? }` — run the matching branch in
    /// sequence mode; a missing branch is a no-op. Only the branch that
    /// ran contributes writes.
    pub(crate) async fn flow_if(
        &self,
        action: &ActionSpec,
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Outcome, WeftError> {
        let cond = condition_field(action, "cond")?;
        let branch = if self.eval_condition(&cond, ctx)? {
            actions_field(action, "then")?
        } else {
            actions_field(action, "else")?
        };
        match branch {
            Some(actions) => self.run_sequence(&actions.0, ctx, depth).await,
            None => Ok(Outcome::done()),
        }
    }

    /// `flow_switch { value, cases, default? }` — stringified value keys
    /// into `cases`.
    pub(crate) async fn flow_switch(
        &self,
        action: &ActionSpec,
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Outcome, WeftError> {
        let value = self.eval_arg(action, "value", ctx)?.to_display_string();
        let cases = action.get("cases").and_then(|c| c.as_object());

        let branch = match cases.and_then(|cases| cases.get(&value)) {
            Some(matched) => Some(serde_json::from_value::<Actions>(matched.clone()).map_err(
                |e| WeftError::validation(format!("flow_switch case '{value}': {e}")),
            )?),
            None => actions_field(action, "default")?,
        };
        match branch {
            Some(actions) => self.run_sequence(&actions.0, ctx, depth).await,
            None => Ok(Outcome::done()),
        }
    }

    /// `flow_while { cond, do, max_iterations? }` — condition re-evaluated
    /// before each iteration, bounded (default 1000). Exceeding the bound
    /// is a loop-bound runtime error.
    pub(crate) async fn flow_while(
        &self,
        action: &ActionSpec,
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Outcome, WeftError> {
        let cond = condition_field(action, "cond")?;
        let body = actions_field(action, "do")?.unwrap_or_default();
        let max_iterations = action
            .get("max_iterations")
            .and_then(|v| v.as_u64())
            .unwrap_or(self.config().max_loop_iterations);

        let mut iterations = 0u64;
        while self.eval_condition(&cond, ctx)? {
            iterations += 1;
            if iterations > max_iterations {
                return Err(WeftError::runtime(
                    RuntimeErrorKind::LoopBound,
                    format!("flow_while exceeded {max_iterations} iterations"),
                ));
            }
            let outcome = self.run_sequence(&body.0, ctx, depth).await?;
            match outcome.signal {
                Signal::Break => break,
                Signal::Continue => {}
                other => return Ok(Outcome::signal(other)),
            }
        }
        Ok(Outcome::done())
    }

    /// `repeat { times, do }` — `times` evaluated once; the loop index is
    /// bound as `index`.
    pub(crate) async fn flow_repeat(
        &self,
        action: &ActionSpec,
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Outcome, WeftError> {
        let times = self.eval_arg(action, "times", ctx)?.coerce_number();
        if times.is_nan() || times < 0.0 {
            return Err(WeftError::validation("repeat requires a non-negative 'times'"));
        }
        let body = actions_field(action, "do")?.unwrap_or_default();

        for index in 0..times as u64 {
            ctx.set("index", Value::Number(index as f64));
            let outcome = self.run_sequence(&body.0, ctx, depth).await?;
            match outcome.signal {
                Signal::Break => break,
                Signal::Continue => {}
                other => return Ok(Outcome::signal(other)),
            }
        }
        Ok(Outcome::done())
    }

    /// `parallel { actions }` — independent branches, forked contexts,
    /// all awaited; completed branches merge writes in declaration order.
    pub(crate) async fn flow_parallel(
        &self,
        action: &ActionSpec,
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Outcome, WeftError> {
        let branches = actions_field(action, "actions")?.unwrap_or_default();
        self.run_branches(&branches.0, ctx, depth).await
    }

    /// `batch { items, each, concurrency? }` — run `each` once per element
    /// with `item`/`index` bound in an iteration-scoped context that is
    /// discarded afterwards. Failures are reported per element and do not
    /// stop the batch.
    pub(crate) async fn flow_batch(
        &self,
        action: &ActionSpec,
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Outcome, WeftError> {
        let items = match self.eval_arg(action, "items", ctx)? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(WeftError::validation(format!(
                    "batch items must be an array, got {}",
                    other.type_tag()
                )))
            }
        };
        let each = actions_field(action, "each")?.unwrap_or_default();
        let concurrency = action
            .get("concurrency")
            .and_then(|v| v.as_u64())
            .unwrap_or(1)
            .max(1) as usize;

        for (window_start, window) in items.chunks(concurrency).enumerate() {
            let mut forks: Vec<ActionContext> = Vec::with_capacity(window.len());
            for (offset, item) in window.iter().enumerate() {
                let mut fork = ctx.fork();
                fork.set("item", item.clone());
                fork.set("index", Value::Number((window_start * concurrency + offset) as f64));
                forks.push(fork);
            }
            let futures = forks
                .iter_mut()
                .map(|fork| self.run_sequence(&each.0, fork, depth));
            let results = futures_util::future::join_all(futures).await;
            for (offset, result) in results.into_iter().enumerate() {
                if let Err(err) = result {
                    // Reported per element; the batch continues
                    self.errors().handle(
                        err,
                        weft_core::ErrorCategory::Action,
                        weft_core::Severity::Error,
                        Some(&format!("batch[{}]", window_start * concurrency + offset)),
                    )?;
                }
            }
            // Iteration contexts are discarded, never merged
        }
        Ok(Outcome::done())
    }

    /// `try { do, catch?, finally? }` — `catch` binds `error`; `finally`
    /// always runs and cannot overwrite the outer signal unless it itself
    /// fails.
    pub(crate) async fn flow_try(
        &self,
        action: &ActionSpec,
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Outcome, WeftError> {
        let body = actions_field(action, "do")?.unwrap_or_default();
        let catch = actions_field(action, "catch")?;
        let finally = actions_field(action, "finally")?;

        let mut outcome = match self.run_sequence(&body.0, ctx, depth).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => match &catch {
                Some(catch) => {
                    ctx.set("error", Value::String(err.to_string()));
                    self.run_sequence(&catch.0, ctx, depth).await
                }
                None => Err(err),
            },
        };

        if let Some(finally) = finally {
            match self.run_sequence(&finally.0, ctx, depth).await {
                // A clean finally never overwrites the outer result
                Ok(_) => {}
                Err(err) => outcome = Err(err),
            }
        }
        outcome
    }

    /// `call_flow { flow, args?, as? }` — bind declared parameters with
    /// type and default checks, run with a fresh scratch, capture the
    /// `return` value into `as`. Recursion is bounded.
    pub(crate) async fn call_flow(
        &self,
        action: &ActionSpec,
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Outcome, WeftError> {
        if depth + 1 > self.config().max_call_depth {
            return Err(WeftError::runtime(
                RuntimeErrorKind::CallDepth,
                format!("call_flow deeper than {}", self.config().max_call_depth),
            ));
        }
        let flow_name = self.required_str(action, "flow", ctx)?;
        let args = self.eval_arg(action, "args", ctx)?;

        let mut flow_ctx = ctx.fork();
        let value = self.invoke_flow(&flow_name, &args, &mut flow_ctx, depth + 1).await?;

        if let Some(alias) = action.get_str("as") {
            ctx.set(alias.to_string(), value.clone().unwrap_or(Value::Null));
        }
        Ok(Outcome { value, signal: Signal::Continue })
    }

    /// Shared flow invocation: parameter binding + body execution. Returns
    /// the flow's `return` value, if any.
    pub(crate) async fn invoke_flow(
        &self,
        flow_name: &str,
        args: &Value,
        flow_ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Option<Value>, WeftError> {
        let spec = self.spec();
        let flow = spec.flow(flow_name).ok_or_else(|| {
            WeftError::runtime(
                RuntimeErrorKind::UnknownFlow,
                format!("call_flow references unknown flow '{flow_name}'"),
            )
        })?;

        for param in &flow.parameters {
            let supplied = args.get_member(&param.name);
            let value = if supplied.is_null() {
                match &param.default {
                    Some(default) => Value::from_json(default.clone()),
                    None if param.required => {
                        return Err(WeftError::validation(format!(
                            "flow '{flow_name}' requires parameter '{}'",
                            param.name
                        )))
                    }
                    None => Value::Null,
                }
            } else {
                supplied
            };
            if !param.param_type.accepts(&value) {
                return Err(WeftError::validation(format!(
                    "flow '{flow_name}' parameter '{}' expects {}, got {}",
                    param.name,
                    param.param_type.as_str(),
                    value.type_tag()
                )));
            }
            flow_ctx.set(param.name.clone(), value);
        }

        let outcome = self.run_sequence(&flow.actions.0, flow_ctx, depth).await?;
        Ok(match outcome.signal {
            Signal::Return { value } => value,
            _ => None,
        })
    }

    /// Run a flow by name with an already-seeded context (used by the
    /// per-action error policy).
    pub(crate) async fn run_flow_by_name(
        &self,
        flow_name: &str,
        ctx: &mut ActionContext,
        depth: usize,
    ) -> Result<Option<Value>, WeftError> {
        self.invoke_flow(flow_name, &Value::Null, ctx, depth + 1).await
    }
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
