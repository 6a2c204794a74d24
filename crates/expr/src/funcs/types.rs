// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Type checks and conversions

use super::{arg, text};
use weft_core::Value;

pub(super) fn type_of(args: &[Value]) -> Value {
    Value::String(arg(args, 0).type_tag().to_string())
}

pub(super) fn is_string(args: &[Value]) -> Value {
    Value::Bool(matches!(args.first(), Some(Value::String(_))))
}

pub(super) fn is_number(args: &[Value]) -> Value {
    Value::Bool(matches!(args.first(), Some(Value::Number(_))))
}

pub(super) fn is_bool(args: &[Value]) -> Value {
    Value::Bool(matches!(args.first(), Some(Value::Bool(_))))
}

pub(super) fn is_array(args: &[Value]) -> Value {
    Value::Bool(matches!(args.first(), Some(Value::Array(_))))
}

pub(super) fn is_object(args: &[Value]) -> Value {
    Value::Bool(matches!(args.first(), Some(Value::Object(_))))
}

pub(super) fn is_null(args: &[Value]) -> Value {
    Value::Bool(matches!(args.first(), Some(Value::Null) | None))
}

pub(super) fn to_string(args: &[Value]) -> Value {
    Value::String(text(args, 0))
}

pub(super) fn to_number(args: &[Value]) -> Value {
    Value::Number(arg(args, 0).coerce_number())
}

pub(super) fn to_bool(args: &[Value]) -> Value {
    Value::Bool(arg(args, 0).is_truthy())
}

pub(super) fn to_json(args: &[Value]) -> Value {
    Value::String(serde_json::to_string(&arg(args, 0).to_json()).unwrap_or_default())
}

pub(super) fn from_json(args: &[Value]) -> Value {
    serde_json::from_str::<serde_json::Value>(&text(args, 0))
        .map(Value::from_json)
        .unwrap_or(Value::Null)
}

/// `default(v, fallback)`: fallback when `v` is null.
pub(super) fn default_value(args: &[Value]) -> Value {
    let v = arg(args, 0);
    if v.is_null() {
        arg(args, 1)
    } else {
        v
    }
}

/// First non-null argument.
pub(super) fn coalesce(args: &[Value]) -> Value {
    args.iter().find(|v| !v.is_null()).cloned().unwrap_or(Value::Null)
}
