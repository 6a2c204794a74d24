// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tree-walking evaluator
//!
//! Missing names and properties evaluate to null rather than erroring;
//! arithmetic coerces operands to numbers and yields NaN on type errors,
//! per standard floating-point rules. `&&`/`||` short-circuit and return
//! the deciding operand's value. Only calls into the fixed function table
//! can fail with a reference error.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::funcs::{self, FnCtx};
use crate::Vars;
use weft_core::{ExpressionError, Value};

pub fn evaluate(expr: &Expr, ctx: &dyn Vars, fcx: &FnCtx) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Ident(name) => Ok(ctx.lookup(name).unwrap_or(Value::Null)),
        Expr::Member(obj, key) => Ok(evaluate(obj, ctx, fcx)?.get_member(key)),
        Expr::Index(obj, idx) => {
            let target = evaluate(obj, ctx, fcx)?;
            let index = evaluate(idx, ctx, fcx)?;
            Ok(index_value(&target, &index))
        }
        Expr::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(evaluate(item, ctx, fcx)?);
            }
            Ok(Value::Array(out))
        }
        Expr::Object(entries) => {
            let mut out = indexmap::IndexMap::with_capacity(entries.len());
            for (key, value) in entries {
                out.insert(key.clone(), evaluate(value, ctx, fcx)?);
            }
            Ok(Value::Object(out))
        }
        Expr::Unary(op, inner) => {
            let v = evaluate(inner, ctx, fcx)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!v.is_truthy()),
                UnaryOp::Neg => Value::Number(-v.coerce_number()),
            })
        }
        Expr::Binary(op, lhs, rhs) => binary(*op, lhs, rhs, ctx, fcx),
        Expr::Ternary(cond, then, otherwise) => {
            if evaluate(cond, ctx, fcx)?.is_truthy() {
                evaluate(then, ctx, fcx)
            } else {
                evaluate(otherwise, ctx, fcx)
            }
        }
        Expr::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, ctx, fcx)?);
            }
            funcs::call(name, &values, fcx)
        }
    }
}

fn binary(
    op: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    ctx: &dyn Vars,
    fcx: &FnCtx,
) -> Result<Value, ExpressionError> {
    // Short-circuit forms first
    match op {
        BinaryOp::And => {
            let l = evaluate(lhs, ctx, fcx)?;
            return if l.is_truthy() { evaluate(rhs, ctx, fcx) } else { Ok(l) };
        }
        BinaryOp::Or => {
            let l = evaluate(lhs, ctx, fcx)?;
            return if l.is_truthy() { Ok(l) } else { evaluate(rhs, ctx, fcx) };
        }
        _ => {}
    }

    let l = evaluate(lhs, ctx, fcx)?;
    let r = evaluate(rhs, ctx, fcx)?;
    Ok(match op {
        BinaryOp::Add => {
            // String on either side concatenates; otherwise numeric
            if matches!(l, Value::String(_)) || matches!(r, Value::String(_)) {
                Value::String(format!("{}{}", l.to_display_string(), r.to_display_string()))
            } else {
                Value::Number(l.coerce_number() + r.coerce_number())
            }
        }
        BinaryOp::Sub => Value::Number(l.coerce_number() - r.coerce_number()),
        BinaryOp::Mul => Value::Number(l.coerce_number() * r.coerce_number()),
        BinaryOp::Div => Value::Number(l.coerce_number() / r.coerce_number()),
        BinaryOp::Mod => Value::Number(l.coerce_number() % r.coerce_number()),
        BinaryOp::Eq => Value::Bool(l.loose_eq(&r)),
        BinaryOp::Ne => Value::Bool(!l.loose_eq(&r)),
        BinaryOp::Lt => compare(&l, &r, |o| o == std::cmp::Ordering::Less),
        BinaryOp::Le => compare(&l, &r, |o| o != std::cmp::Ordering::Greater),
        BinaryOp::Gt => compare(&l, &r, |o| o == std::cmp::Ordering::Greater),
        BinaryOp::Ge => compare(&l, &r, |o| o != std::cmp::Ordering::Less),
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    })
}

/// Ordering comparison: two strings compare lexicographically, anything
/// else compares numerically; NaN on either side is false.
fn compare(l: &Value, r: &Value, pick: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    if let (Value::String(a), Value::String(b)) = (l, r) {
        return Value::Bool(pick(a.cmp(b)));
    }
    let (a, b) = (l.coerce_number(), r.coerce_number());
    match a.partial_cmp(&b) {
        Some(ord) => Value::Bool(pick(ord)),
        None => Value::Bool(false),
    }
}

/// `a[b]`: arrays index by number, objects by string key, strings by
/// character position; anything else is null.
fn index_value(target: &Value, index: &Value) -> Value {
    match (target, index) {
        (Value::Array(_), Value::Number(n)) => target.get_index(*n),
        (Value::Object(_), Value::String(k)) => target.get_member(k),
        (Value::String(s), Value::Number(n)) => {
            if n.is_nan() || n.fract() != 0.0 || *n < 0.0 {
                return Value::Null;
            }
            s.chars()
                .nth(*n as usize)
                .map(|c| Value::String(c.to_string()))
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod tests;
