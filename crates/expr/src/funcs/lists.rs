// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! List and object functions
//!
//! All pure: functions return new values, never mutate their arguments
//! (the language has no assignment, so there is nothing to mutate into).

use super::{arg, num, text};
use indexmap::IndexMap;
use weft_core::Value;

fn items(args: &[Value]) -> Option<&[Value]> {
    match args.first() {
        Some(Value::Array(a)) => Some(a),
        _ => None,
    }
}

pub(super) fn first(args: &[Value]) -> Value {
    items(args).and_then(|a| a.first().cloned()).unwrap_or(Value::Null)
}

pub(super) fn last(args: &[Value]) -> Value {
    items(args).and_then(|a| a.last().cloned()).unwrap_or(Value::Null)
}

pub(super) fn join(args: &[Value]) -> Value {
    let Some(a) = items(args) else { return Value::Null };
    let sep = if args.len() > 1 { text(args, 1) } else { ",".to_string() };
    Value::String(a.iter().map(Value::to_display_string).collect::<Vec<_>>().join(&sep))
}

/// Concatenate arrays; non-array arguments append as single elements.
pub(super) fn concat(args: &[Value]) -> Value {
    let mut out = Vec::new();
    for v in args {
        match v {
            Value::Array(a) => out.extend(a.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Value::Array(out)
}

/// Membership by loose equality on arrays; key presence on objects.
pub(super) fn contains(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Array(a)) => {
            let needle = arg(args, 1);
            Value::Bool(a.iter().any(|v| v.loose_eq(&needle)))
        }
        Some(Value::Object(o)) => Value::Bool(o.contains_key(&text(args, 1))),
        Some(Value::String(s)) => Value::Bool(s.contains(&text(args, 1))),
        _ => Value::Bool(false),
    }
}

pub(super) fn unique(args: &[Value]) -> Value {
    let Some(a) = items(args) else { return Value::Null };
    let mut out: Vec<Value> = Vec::new();
    for v in a {
        if !out.iter().any(|seen| seen.loose_eq(v)) {
            out.push(v.clone());
        }
    }
    Value::Array(out)
}

/// Sort ascending: all-numbers numerically, otherwise by display string.
/// `sort(a, "desc")` reverses.
pub(super) fn sort(args: &[Value]) -> Value {
    let Some(a) = items(args) else { return Value::Null };
    let mut out = a.to_vec();
    let numeric = out.iter().all(|v| matches!(v, Value::Number(_)));
    if numeric {
        out.sort_by(|x, y| {
            x.coerce_number().partial_cmp(&y.coerce_number()).unwrap_or(std::cmp::Ordering::Equal)
        });
    } else {
        out.sort_by_key(|v| v.to_display_string());
    }
    if text(args, 1) == "desc" {
        out.reverse();
    }
    Value::Array(out)
}

/// Reverse arrays and strings.
pub(super) fn reverse(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Array(a)) => {
            let mut out = a.clone();
            out.reverse();
            Value::Array(out)
        }
        Some(Value::String(s)) => Value::String(s.chars().rev().collect()),
        _ => Value::Null,
    }
}

pub(super) fn sum(args: &[Value]) -> Value {
    let Some(a) = items(args) else { return Value::Null };
    Value::Number(a.iter().map(|v| v.coerce_number()).sum())
}

pub(super) fn avg(args: &[Value]) -> Value {
    let Some(a) = items(args) else { return Value::Null };
    if a.is_empty() {
        return Value::Null;
    }
    Value::Number(a.iter().map(|v| v.coerce_number()).sum::<f64>() / a.len() as f64)
}

/// One level of flattening.
pub(super) fn flatten(args: &[Value]) -> Value {
    let Some(a) = items(args) else { return Value::Null };
    let mut out = Vec::new();
    for v in a {
        match v {
            Value::Array(inner) => out.extend(inner.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    Value::Array(out)
}

/// `range(end)` / `range(start, end)` / `range(start, end, step)`.
pub(super) fn range(args: &[Value]) -> Value {
    let (start, end, step) = match args.len() {
        0 => return Value::Array(vec![]),
        1 => (0.0, num(args, 0), 1.0),
        2 => (num(args, 0), num(args, 1), 1.0),
        _ => (num(args, 0), num(args, 1), num(args, 2)),
    };
    if start.is_nan() || end.is_nan() || step.is_nan() || step == 0.0 {
        return Value::Array(vec![]);
    }
    let mut out = Vec::new();
    let mut v = start;
    // Bounded so a bad spec cannot allocate unboundedly
    while ((step > 0.0 && v < end) || (step < 0.0 && v > end)) && out.len() < 100_000 {
        out.push(Value::Number(v));
        v += step;
    }
    Value::Array(out)
}

pub(super) fn chunk(args: &[Value]) -> Value {
    let Some(a) = items(args) else { return Value::Null };
    let size = num(args, 1);
    if size.is_nan() || size < 1.0 {
        return Value::Null;
    }
    Value::Array(
        a.chunks(size as usize).map(|c| Value::Array(c.to_vec())).collect(),
    )
}

pub(super) fn keys(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Object(o)) => {
            Value::Array(o.keys().map(|k| Value::String(k.clone())).collect())
        }
        _ => Value::Null,
    }
}

pub(super) fn values(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Object(o)) => Value::Array(o.values().cloned().collect()),
        _ => Value::Null,
    }
}

/// Shallow merge left to right; later keys win.
pub(super) fn merge(args: &[Value]) -> Value {
    let mut out = IndexMap::new();
    for v in args {
        if let Value::Object(o) = v {
            for (k, val) in o {
                out.insert(k.clone(), val.clone());
            }
        }
    }
    Value::Object(out)
}

pub(super) fn pick(args: &[Value]) -> Value {
    let Some(Value::Object(o)) = args.first() else { return Value::Null };
    let Some(Value::Array(wanted)) = args.get(1) else { return Value::Null };
    let keys: Vec<String> = wanted.iter().map(Value::to_display_string).collect();
    Value::Object(
        o.iter()
            .filter(|(k, _)| keys.iter().any(|w| w == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

pub(super) fn omit(args: &[Value]) -> Value {
    let Some(Value::Object(o)) = args.first() else { return Value::Null };
    let Some(Value::Array(dropped)) = args.get(1) else { return Value::Null };
    let keys: Vec<String> = dropped.iter().map(Value::to_display_string).collect();
    Value::Object(
        o.iter()
            .filter(|(k, _)| !keys.iter().any(|w| w == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}
