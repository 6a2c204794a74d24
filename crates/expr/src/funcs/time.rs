// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Date/time functions
//!
//! Timestamps are millisecond epochs (numbers). Field extractors read in
//! UTC. `now()` is the only impure entry point; everything else is a pure
//! function of its arguments.

use super::{num, text, FnCtx};
use chrono::{DateTime, Datelike, Timelike, Utc};
use weft_core::Value;

fn to_datetime(ms: f64) -> Option<DateTime<Utc>> {
    if ms.is_nan() || ms.is_infinite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64)
}

pub(super) fn now(fcx: &FnCtx) -> Value {
    Value::Number((fcx.now_ms)() as f64)
}

/// `timestamp()` is `now()`; `timestamp("2026-01-01T00:00:00Z")` parses an
/// RFC 3339 string into epoch milliseconds.
pub(super) fn timestamp(args: &[Value], fcx: &FnCtx) -> Value {
    if args.is_empty() {
        return now(fcx);
    }
    let s = text(args, 0);
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| Value::Number(dt.timestamp_millis() as f64))
        .unwrap_or(Value::Number(f64::NAN))
}

/// `formatDate(ms)` renders RFC 3339; `formatDate(ms, fmt)` uses a strftime
/// pattern.
pub(super) fn format_date(args: &[Value]) -> Value {
    let Some(dt) = to_datetime(num(args, 0)) else { return Value::Null };
    if args.len() > 1 {
        Value::String(dt.format(&text(args, 1)).to_string())
    } else {
        Value::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

macro_rules! field_fn {
    ($name:ident, $method:ident) => {
        pub(super) fn $name(args: &[Value]) -> Value {
            match to_datetime(num(args, 0)) {
                Some(dt) => Value::Number(dt.$method() as f64),
                None => Value::Null,
            }
        }
    };
}

field_fn!(year, year);
field_fn!(month, month);
field_fn!(day, day);
field_fn!(hour, hour);
field_fn!(minute, minute);
field_fn!(second, second);

/// Sunday = 0 (platform-facing convention).
pub(super) fn day_of_week(args: &[Value]) -> Value {
    match to_datetime(num(args, 0)) {
        Some(dt) => Value::Number(dt.weekday().num_days_from_sunday() as f64),
        None => Value::Null,
    }
}
