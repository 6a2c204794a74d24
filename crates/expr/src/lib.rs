// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! weft-expr: sandboxed expression evaluation and template interpolation
//!
//! Two surfaces:
//! - *expression*: the whole string is one expression, the result is the
//!   raw value (`evaluate`)
//! - *template*: a string containing `${expr}` occurrences; the result is
//!   the concatenation (`interpolate`), unless the whole string is a single
//!   bare `${expr}`, in which case `evaluate_template` returns the raw
//!   value, preserving its type
//!
//! The language is a side-effect-free subset over the evaluation context:
//! member access, arithmetic, comparison, logic, ternary, literals, and
//! calls into a fixed function table. No assignment, no loops, no arbitrary
//! invocation. `x | f(args)` is sugar for `f(x, args)`. Missing names and
//! properties evaluate to null; arithmetic on non-numbers yields NaN.
//! Deterministic for a fixed context, except `random()`/`now()`.

pub mod ast;
pub mod eval;
pub mod funcs;
pub mod parser;
pub mod template;
pub mod token;

use std::sync::Arc;
use weft_core::{ExpressionError, Value};

pub use ast::{BinaryOp, Expr, UnaryOp};

/// Maximum accepted source length in bytes.
pub const MAX_SOURCE_LEN: usize = 64 * 1024;

/// Maximum expression tree depth.
pub const MAX_DEPTH: usize = 64;

/// Read surface expressions see: trigger-derived keys plus scratch.
pub trait Vars {
    fn lookup(&self, name: &str) -> Option<Value>;
}

impl Vars for std::collections::HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl Vars for indexmap::IndexMap<String, Value> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

type NowFn = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Expression evaluator with configured limits and time source.
#[derive(Clone)]
pub struct Evaluator {
    max_source_len: usize,
    max_depth: usize,
    now_ms: NowFn,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            max_source_len: MAX_SOURCE_LEN,
            max_depth: MAX_DEPTH,
            now_ms: Arc::new(|| {
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64
            }),
        }
    }

    /// Override the `now()` time source (tests inject a fake clock reading).
    pub fn with_now(mut self, now_ms: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.now_ms = Arc::new(now_ms);
        self
    }

    /// Evaluate a whole-string expression to its raw value.
    pub fn evaluate(&self, src: &str, ctx: &dyn Vars) -> Result<Value, ExpressionError> {
        if src.len() > self.max_source_len {
            return Err(ExpressionError::limit(format!(
                "expression longer than {} bytes",
                self.max_source_len
            )));
        }
        let expr = parser::parse(src, self.max_depth)?;
        eval::evaluate(&expr, ctx, &self.fn_ctx())
    }

    /// Interpolate every `${expr}` occurrence, forcing string conversion.
    pub fn interpolate(&self, template: &str, ctx: &dyn Vars) -> Result<String, ExpressionError> {
        template::interpolate(self, template, ctx)
    }

    /// Like [`interpolate`](Self::interpolate), but a template that is one
    /// single bare `${expr}` returns the raw value, preserving its type.
    pub fn evaluate_template(
        &self,
        template: &str,
        ctx: &dyn Vars,
    ) -> Result<Value, ExpressionError> {
        template::evaluate_template(self, template, ctx)
    }

    /// Evaluate a condition string (bare expression, single `${expr}`, or a
    /// mixed template spliced as literals) down to a boolean.
    pub fn evaluate_condition(&self, source: &str, ctx: &dyn Vars) -> Result<bool, ExpressionError> {
        template::evaluate_condition(self, source, ctx)
    }

    fn fn_ctx(&self) -> funcs::FnCtx {
        funcs::FnCtx { now_ms: self.now_ms.clone() }
    }

    pub(crate) fn max_source_len(&self) -> usize {
        self.max_source_len
    }
}
