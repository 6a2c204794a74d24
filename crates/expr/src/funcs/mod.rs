// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed function table
//!
//! Expressions can call exactly these names; anything else is a reference
//! error. Names are lowerCamelCase. Every function is total over `Value`
//! arguments: wrong-typed inputs produce null or NaN rather than erroring,
//! matching the rest of the language. Adding a function means adding a
//! match arm here; there is no dynamic registration.

mod lists;
mod numbers;
mod random;
mod strings;
mod time;
mod types;

use std::sync::Arc;
use weft_core::{ExpressionError, Value};

/// Per-evaluation context for the impure functions.
pub struct FnCtx {
    pub now_ms: Arc<dyn Fn() -> u64 + Send + Sync>,
}

/// Dispatch a call by name.
pub fn call(name: &str, args: &[Value], fcx: &FnCtx) -> Result<Value, ExpressionError> {
    let out = match name {
        // --- strings ---
        "toUpperCase" => strings::to_upper_case(args),
        "toLowerCase" => strings::to_lower_case(args),
        "capitalize" => strings::capitalize(args),
        "trim" => strings::trim(args),
        "trimStart" => strings::trim_start(args),
        "trimEnd" => strings::trim_end(args),
        "startsWith" => strings::starts_with(args),
        "endsWith" => strings::ends_with(args),
        "includes" => strings::includes(args),
        "indexOf" => strings::index_of(args),
        "slice" => strings::slice(args),
        "replace" => strings::replace(args),
        "replaceAll" => strings::replace_all(args),
        "split" => strings::split(args),
        "padStart" => strings::pad_start(args),
        "padEnd" => strings::pad_end(args),
        "repeat" => strings::repeat(args),
        "charAt" => strings::char_at(args),
        "length" => strings::length(args),

        // --- numbers ---
        "abs" => numbers::abs(args),
        "ceil" => numbers::ceil(args),
        "floor" => numbers::floor(args),
        "round" => numbers::round(args),
        "trunc" => numbers::trunc(args),
        "sqrt" => numbers::sqrt(args),
        "pow" => numbers::pow(args),
        "min" => numbers::min(args),
        "max" => numbers::max(args),
        "clamp" => numbers::clamp(args),
        "sign" => numbers::sign(args),
        "toFixed" => numbers::to_fixed(args),
        "parseInt" => numbers::parse_int(args),
        "parseFloat" => numbers::parse_float(args),
        "isNaN" => numbers::is_nan(args),
        "isFinite" => numbers::is_finite(args),

        // --- lists and objects ---
        "first" => lists::first(args),
        "last" => lists::last(args),
        "join" => lists::join(args),
        "concat" => lists::concat(args),
        "contains" => lists::contains(args),
        "unique" => lists::unique(args),
        "sort" => lists::sort(args),
        "reverse" => lists::reverse(args),
        "sum" => lists::sum(args),
        "avg" => lists::avg(args),
        "flatten" => lists::flatten(args),
        "range" => lists::range(args),
        "chunk" => lists::chunk(args),
        "keys" => lists::keys(args),
        "values" => lists::values(args),
        "merge" => lists::merge(args),
        "pick" => lists::pick(args),
        "omit" => lists::omit(args),

        // --- date/time ---
        "now" => time::now(fcx),
        "timestamp" => time::timestamp(args, fcx),
        "formatDate" => time::format_date(args),
        "year" => time::year(args),
        "month" => time::month(args),
        "day" => time::day(args),
        "hour" => time::hour(args),
        "minute" => time::minute(args),
        "second" => time::second(args),
        "dayOfWeek" => time::day_of_week(args),

        // --- randomness ---
        "random" => random::random(args),
        "randomInt" => random::random_int(args),
        "randomPick" => random::random_pick(args),
        "shuffle" => random::shuffle(args),
        "uuid" => random::uuid(args),

        // --- type checks and conversion ---
        "typeOf" => types::type_of(args),
        "isString" => types::is_string(args),
        "isNumber" => types::is_number(args),
        "isBool" => types::is_bool(args),
        "isArray" => types::is_array(args),
        "isObject" => types::is_object(args),
        "isNull" => types::is_null(args),
        "toString" => types::to_string(args),
        "toNumber" => types::to_number(args),
        "toBool" => types::to_bool(args),
        "toJson" => types::to_json(args),
        "fromJson" => types::from_json(args),
        "default" => types::default_value(args),
        "coalesce" => types::coalesce(args),

        _ => {
            return Err(ExpressionError::reference(format!("unknown function '{name}'")));
        }
    };
    Ok(out)
}

// --- shared argument helpers ---

pub(crate) fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Null)
}

pub(crate) fn num(args: &[Value], i: usize) -> f64 {
    args.get(i).map(|v| v.coerce_number()).unwrap_or(f64::NAN)
}

pub(crate) fn text(args: &[Value], i: usize) -> String {
    args.get(i).map(|v| v.to_display_string()).unwrap_or_default()
}

#[cfg(test)]
#[path = "funcs_tests.rs"]
mod tests;
