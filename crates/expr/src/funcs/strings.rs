// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! String functions

use super::{arg, num, text};
use weft_core::Value;

pub(super) fn to_upper_case(args: &[Value]) -> Value {
    Value::String(text(args, 0).to_uppercase())
}

pub(super) fn to_lower_case(args: &[Value]) -> Value {
    Value::String(text(args, 0).to_lowercase())
}

pub(super) fn capitalize(args: &[Value]) -> Value {
    let s = text(args, 0);
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            Value::String(first.to_uppercase().collect::<String>() + chars.as_str())
        }
        None => Value::String(String::new()),
    }
}

pub(super) fn trim(args: &[Value]) -> Value {
    Value::String(text(args, 0).trim().to_string())
}

pub(super) fn trim_start(args: &[Value]) -> Value {
    Value::String(text(args, 0).trim_start().to_string())
}

pub(super) fn trim_end(args: &[Value]) -> Value {
    Value::String(text(args, 0).trim_end().to_string())
}

pub(super) fn starts_with(args: &[Value]) -> Value {
    Value::Bool(text(args, 0).starts_with(&text(args, 1)))
}

pub(super) fn ends_with(args: &[Value]) -> Value {
    Value::Bool(text(args, 0).ends_with(&text(args, 1)))
}

/// Substring test on strings; membership test would be `contains` (lists).
pub(super) fn includes(args: &[Value]) -> Value {
    Value::Bool(text(args, 0).contains(&text(args, 1)))
}

/// Character index of the first occurrence, -1 when absent. On arrays:
/// index of the first loosely-equal element.
pub(super) fn index_of(args: &[Value]) -> Value {
    if let Some(Value::Array(items)) = args.first() {
        let needle = arg(args, 1);
        return match items.iter().position(|v| v.loose_eq(&needle)) {
            Some(i) => Value::Number(i as f64),
            None => Value::Number(-1.0),
        };
    }
    let hay = text(args, 0);
    let needle = text(args, 1);
    match hay.find(&needle) {
        Some(byte_pos) => Value::Number(hay[..byte_pos].chars().count() as f64),
        None => Value::Number(-1.0),
    }
}

/// `slice(s, start, end?)` with negative indexes counting from the end.
/// Works on strings (by character) and arrays.
pub(super) fn slice(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Array(items)) => {
            let (start, end) = slice_bounds(items.len(), args);
            Value::Array(items[start..end].to_vec())
        }
        _ => {
            let chars: Vec<char> = text(args, 0).chars().collect();
            let (start, end) = slice_bounds(chars.len(), args);
            Value::String(chars[start..end].iter().collect())
        }
    }
}

fn slice_bounds(len: usize, args: &[Value]) -> (usize, usize) {
    let resolve = |n: f64, default: usize| -> usize {
        if n.is_nan() {
            return default;
        }
        if n < 0.0 {
            len.saturating_sub((-n) as usize)
        } else {
            (n as usize).min(len)
        }
    };
    let start = resolve(num(args, 1), 0);
    let end = if args.len() > 2 { resolve(num(args, 2), len) } else { len };
    (start, end.max(start))
}

pub(super) fn replace(args: &[Value]) -> Value {
    Value::String(text(args, 0).replacen(&text(args, 1), &text(args, 2), 1))
}

pub(super) fn replace_all(args: &[Value]) -> Value {
    Value::String(text(args, 0).replace(&text(args, 1), &text(args, 2)))
}

pub(super) fn split(args: &[Value]) -> Value {
    let s = text(args, 0);
    let sep = text(args, 1);
    if sep.is_empty() {
        return Value::Array(s.chars().map(|c| Value::String(c.to_string())).collect());
    }
    Value::Array(s.split(&sep).map(|p| Value::String(p.to_string())).collect())
}

pub(super) fn pad_start(args: &[Value]) -> Value {
    Value::String(pad(args, true))
}

pub(super) fn pad_end(args: &[Value]) -> Value {
    Value::String(pad(args, false))
}

fn pad(args: &[Value], at_start: bool) -> String {
    let s = text(args, 0);
    let target = num(args, 1);
    if target.is_nan() || target < 0.0 {
        return s;
    }
    let target = target as usize;
    let fill = match args.get(2) {
        Some(v) => v.to_display_string(),
        None => " ".to_string(),
    };
    let current = s.chars().count();
    if current >= target || fill.is_empty() {
        return s;
    }
    let mut padding = String::new();
    let mut fill_chars = fill.chars().cycle();
    for _ in 0..(target - current) {
        if let Some(c) = fill_chars.next() {
            padding.push(c);
        }
    }
    if at_start {
        padding + &s
    } else {
        s + &padding
    }
}

pub(super) fn repeat(args: &[Value]) -> Value {
    let n = num(args, 1);
    if n.is_nan() || n < 0.0 || n > 10_000.0 {
        return Value::String(String::new());
    }
    Value::String(text(args, 0).repeat(n as usize))
}

pub(super) fn char_at(args: &[Value]) -> Value {
    let n = num(args, 1);
    if n.is_nan() || n < 0.0 || n.fract() != 0.0 {
        return Value::String(String::new());
    }
    match text(args, 0).chars().nth(n as usize) {
        Some(c) => Value::String(c.to_string()),
        None => Value::String(String::new()),
    }
}

/// Character count of strings, element count of arrays, entry count of
/// objects; null for anything else.
pub(super) fn length(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::String(s)) => Value::Number(s.chars().count() as f64),
        Some(Value::Array(a)) => Value::Number(a.len() as f64),
        Some(Value::Object(o)) => Value::Number(o.len() as f64),
        Some(Value::Bytes(b)) => Value::Number(b.len() as f64),
        _ => Value::Null,
    }
}
