// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Randomness functions — the explicitly non-deterministic corner of the
//! sandbox.

use super::num;
use rand::seq::SliceRandom;
use rand::Rng;
use weft_core::Value;

/// `random()` in [0, 1); `random(n)` in [0, n).
pub(super) fn random(args: &[Value]) -> Value {
    let mut rng = rand::thread_rng();
    if args.is_empty() {
        return Value::Number(rng.gen::<f64>());
    }
    let n = num(args, 0);
    if n.is_nan() || n <= 0.0 {
        return Value::Number(f64::NAN);
    }
    Value::Number(rng.gen::<f64>() * n)
}

/// `randomInt(max)` in [0, max]; `randomInt(min, max)` inclusive both ends.
pub(super) fn random_int(args: &[Value]) -> Value {
    let (lo, hi) = match args.len() {
        0 => return Value::Number(f64::NAN),
        1 => (0.0, num(args, 0)),
        _ => (num(args, 0), num(args, 1)),
    };
    if lo.is_nan() || hi.is_nan() || lo > hi {
        return Value::Number(f64::NAN);
    }
    let (lo, hi) = (lo as i64, hi as i64);
    Value::Number(rand::thread_rng().gen_range(lo..=hi) as f64)
}

pub(super) fn random_pick(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Array(a)) if !a.is_empty() => {
            a.choose(&mut rand::thread_rng()).cloned().unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

pub(super) fn shuffle(args: &[Value]) -> Value {
    match args.first() {
        Some(Value::Array(a)) => {
            let mut out = a.clone();
            out.shuffle(&mut rand::thread_rng());
            Value::Array(out)
        }
        _ => Value::Null,
    }
}

pub(super) fn uuid(_args: &[Value]) -> Value {
    Value::String(::uuid::Uuid::new_v4().to_string())
}
