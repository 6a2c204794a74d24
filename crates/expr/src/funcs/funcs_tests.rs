// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;

fn fcx() -> FnCtx {
    FnCtx { now_ms: Arc::new(|| 1_700_000_000_000) }
}

fn call_ok(name: &str, args: &[Value]) -> Value {
    call(name, args, &fcx()).unwrap()
}

fn s(v: &str) -> Value {
    Value::String(v.into())
}

fn n(v: f64) -> Value {
    Value::Number(v)
}

fn arr(items: &[Value]) -> Value {
    Value::Array(items.to_vec())
}

// --- strings ---

#[yare::parameterized(
    upper      = { "toUpperCase", "héllo", "HÉLLO" },
    lower      = { "toLowerCase", "HeLLo", "hello" },
    capitalize = { "capitalize", "ada lovelace", "Ada lovelace" },
    trim       = { "trim", "  x  ", "x" },
    trim_start = { "trimStart", "  x  ", "x  " },
    trim_end   = { "trimEnd", "  x  ", "  x" },
)]
fn unary_string_fns(name: &str, input: &str, expected: &str) {
    assert_eq!(call_ok(name, &[s(input)]), s(expected));
}

#[test]
fn predicates_and_search() {
    assert_eq!(call_ok("startsWith", &[s("weft"), s("we")]), Value::Bool(true));
    assert_eq!(call_ok("endsWith", &[s("weft"), s("ft")]), Value::Bool(true));
    assert_eq!(call_ok("includes", &[s("weft"), s("ef")]), Value::Bool(true));
    assert_eq!(call_ok("indexOf", &[s("héllo"), s("llo")]), n(2.0));
    assert_eq!(call_ok("indexOf", &[s("abc"), s("z")]), n(-1.0));
}

#[test]
fn slice_replace_split() {
    assert_eq!(call_ok("slice", &[s("hello"), n(1.0), n(3.0)]), s("el"));
    assert_eq!(call_ok("slice", &[s("hello"), n(-2.0)]), s("lo"));
    assert_eq!(call_ok("replace", &[s("a-a"), s("a"), s("b")]), s("b-a"));
    assert_eq!(call_ok("replaceAll", &[s("a-a"), s("a"), s("b")]), s("b-b"));
    assert_eq!(
        call_ok("split", &[s("a,b"), s(",")]),
        arr(&[s("a"), s("b")])
    );
    assert_eq!(call_ok("split", &[s("ab"), s("")]), arr(&[s("a"), s("b")]));
}

#[test]
fn padding_and_repeat() {
    assert_eq!(call_ok("padStart", &[s("5"), n(3.0), s("0")]), s("005"));
    assert_eq!(call_ok("padEnd", &[s("5"), n(3.0)]), s("5  "));
    assert_eq!(call_ok("padStart", &[s("long"), n(2.0)]), s("long"));
    assert_eq!(call_ok("repeat", &[s("ab"), n(3.0)]), s("ababab"));
    assert_eq!(call_ok("repeat", &[s("ab"), n(-1.0)]), s(""));
}

#[test]
fn length_is_polymorphic() {
    assert_eq!(call_ok("length", &[s("héllo")]), n(5.0));
    assert_eq!(call_ok("length", &[arr(&[n(1.0), n(2.0)])]), n(2.0));
    assert_eq!(call_ok("length", &[n(5.0)]), Value::Null);
}

// --- numbers ---

#[yare::parameterized(
    abs_neg = { "abs", -2.5, 2.5 },
    ceil    = { "ceil", 1.1, 2.0 },
    floor   = { "floor", 1.9, 1.0 },
    round   = { "round", 2.5, 3.0 },
    trunc   = { "trunc", -1.7, -1.0 },
    sqrt    = { "sqrt", 9.0, 3.0 },
)]
fn unary_numeric_fns(name: &str, input: f64, expected: f64) {
    assert_eq!(call_ok(name, &[n(input)]), n(expected));
}

#[test]
fn variadic_min_max_and_spread() {
    assert_eq!(call_ok("min", &[n(3.0), n(1.0), n(2.0)]), n(1.0));
    assert_eq!(call_ok("max", &[arr(&[n(3.0), n(7.0), n(2.0)])]), n(7.0));
    assert_eq!(call_ok("min", &[]), Value::Null);
}

#[test]
fn clamp_and_sign() {
    assert_eq!(call_ok("clamp", &[n(15.0), n(0.0), n(10.0)]), n(10.0));
    assert_eq!(call_ok("clamp", &[n(-5.0), n(0.0), n(10.0)]), n(0.0));
    assert_eq!(call_ok("sign", &[n(-3.0)]), n(-1.0));
    assert_eq!(call_ok("sign", &[n(0.0)]), n(0.0));
}

#[test]
fn parsing_and_formatting() {
    assert_eq!(call_ok("toFixed", &[n(3.14159), n(2.0)]), s("3.14"));
    assert_eq!(call_ok("parseInt", &[s("42px")]), n(42.0));
    assert_eq!(call_ok("parseFloat", &[s("2.5")]), n(2.5));
    let Value::Number(bad) = call_ok("parseInt", &[s("px")]) else { panic!() };
    assert!(bad.is_nan());
    assert_eq!(call_ok("isNaN", &[s("abc")]), Value::Bool(true));
    assert_eq!(call_ok("isFinite", &[n(1.0)]), Value::Bool(true));
}

// --- lists and objects ---

#[test]
fn list_basics() {
    let a = arr(&[n(3.0), n(1.0), n(2.0)]);
    assert_eq!(call_ok("first", &[a.clone()]), n(3.0));
    assert_eq!(call_ok("last", &[a.clone()]), n(2.0));
    assert_eq!(call_ok("join", &[a.clone(), s("-")]), s("3-1-2"));
    assert_eq!(call_ok("sum", &[a.clone()]), n(6.0));
    assert_eq!(call_ok("avg", &[a.clone()]), n(2.0));
    assert_eq!(call_ok("sort", &[a.clone()]), arr(&[n(1.0), n(2.0), n(3.0)]));
    assert_eq!(call_ok("sort", &[a.clone(), s("desc")]), arr(&[n(3.0), n(2.0), n(1.0)]));
    assert_eq!(call_ok("reverse", &[a]), arr(&[n(2.0), n(1.0), n(3.0)]));
}

#[test]
fn membership_and_dedup() {
    let a = arr(&[n(1.0), n(2.0), n(1.0)]);
    assert_eq!(call_ok("contains", &[a.clone(), n(2.0)]), Value::Bool(true));
    assert_eq!(call_ok("contains", &[a.clone(), n(9.0)]), Value::Bool(false));
    assert_eq!(call_ok("unique", &[a]), arr(&[n(1.0), n(2.0)]));
}

#[test]
fn structure_builders() {
    assert_eq!(
        call_ok("concat", &[arr(&[n(1.0)]), n(2.0), arr(&[n(3.0)])]),
        arr(&[n(1.0), n(2.0), n(3.0)])
    );
    assert_eq!(
        call_ok("flatten", &[arr(&[arr(&[n(1.0)]), n(2.0)])]),
        arr(&[n(1.0), n(2.0)])
    );
    assert_eq!(call_ok("range", &[n(3.0)]), arr(&[n(0.0), n(1.0), n(2.0)]));
    assert_eq!(call_ok("range", &[n(1.0), n(7.0), n(3.0)]), arr(&[n(1.0), n(4.0)]));
    assert_eq!(
        call_ok("chunk", &[arr(&[n(1.0), n(2.0), n(3.0)]), n(2.0)]),
        arr(&[arr(&[n(1.0), n(2.0)]), arr(&[n(3.0)])])
    );
}

#[test]
fn object_helpers() {
    let mut o = indexmap::IndexMap::new();
    o.insert("a".to_string(), n(1.0));
    o.insert("b".to_string(), n(2.0));
    let obj = Value::Object(o);

    assert_eq!(call_ok("keys", &[obj.clone()]), arr(&[s("a"), s("b")]));
    assert_eq!(call_ok("values", &[obj.clone()]), arr(&[n(1.0), n(2.0)]));
    assert_eq!(call_ok("pick", &[obj.clone(), arr(&[s("a")])]).get_member("b"), Value::Null);
    assert_eq!(call_ok("omit", &[obj.clone(), arr(&[s("a")])]).get_member("b"), n(2.0));

    let mut o2 = indexmap::IndexMap::new();
    o2.insert("b".to_string(), n(9.0));
    let merged = call_ok("merge", &[obj, Value::Object(o2)]);
    assert_eq!(merged.get_member("a"), n(1.0));
    assert_eq!(merged.get_member("b"), n(9.0));
}

// --- time ---

#[test]
fn now_uses_injected_clock() {
    assert_eq!(call_ok("now", &[]), n(1_700_000_000_000.0));
    assert_eq!(call_ok("timestamp", &[]), n(1_700_000_000_000.0));
}

#[test]
fn timestamp_parses_rfc3339() {
    assert_eq!(
        call_ok("timestamp", &[s("1970-01-01T00:00:01Z")]),
        n(1000.0)
    );
    let Value::Number(bad) = call_ok("timestamp", &[s("not a date")]) else { panic!() };
    assert!(bad.is_nan());
}

#[test]
fn date_fields_in_utc() {
    // 2023-11-14T22:13:20Z
    let ts = n(1_700_000_000_000.0);
    assert_eq!(call_ok("year", &[ts.clone()]), n(2023.0));
    assert_eq!(call_ok("month", &[ts.clone()]), n(11.0));
    assert_eq!(call_ok("day", &[ts.clone()]), n(14.0));
    assert_eq!(call_ok("hour", &[ts.clone()]), n(22.0));
    assert_eq!(call_ok("minute", &[ts.clone()]), n(13.0));
    assert_eq!(call_ok("second", &[ts.clone()]), n(20.0));
    assert_eq!(call_ok("dayOfWeek", &[ts.clone()]), n(2.0)); // Tuesday
    assert_eq!(call_ok("formatDate", &[ts, s("%Y-%m-%d")]), s("2023-11-14"));
}

// --- randomness ---

#[test]
fn random_stays_in_bounds() {
    for _ in 0..50 {
        let Value::Number(v) = call_ok("random", &[]) else { panic!() };
        assert!((0.0..1.0).contains(&v));
        let Value::Number(i) = call_ok("randomInt", &[n(1.0), n(3.0)]) else { panic!() };
        assert!((1.0..=3.0).contains(&i));
        assert_eq!(i.fract(), 0.0);
    }
}

#[test]
fn random_pick_and_shuffle_preserve_elements() {
    let a = arr(&[n(1.0), n(2.0), n(3.0)]);
    let picked = call_ok("randomPick", &[a.clone()]);
    assert!(a.as_array().unwrap().contains(&picked));

    let Value::Array(shuffled) = call_ok("shuffle", &[a.clone()]) else { panic!() };
    assert_eq!(shuffled.len(), 3);
    for v in a.as_array().unwrap() {
        assert!(shuffled.contains(v));
    }
    assert_eq!(call_ok("randomPick", &[arr(&[])]), Value::Null);
}

#[test]
fn uuid_is_v4_shaped() {
    let Value::String(u) = call_ok("uuid", &[]) else { panic!() };
    assert_eq!(u.len(), 36);
    assert_eq!(u.chars().filter(|c| *c == '-').count(), 4);
}

// --- types ---

#[test]
fn type_checks() {
    assert_eq!(call_ok("typeOf", &[s("x")]), s("string"));
    assert_eq!(call_ok("typeOf", &[Value::Null]), s("null"));
    assert_eq!(call_ok("isString", &[s("x")]), Value::Bool(true));
    assert_eq!(call_ok("isNumber", &[n(1.0)]), Value::Bool(true));
    assert_eq!(call_ok("isArray", &[arr(&[])]), Value::Bool(true));
    assert_eq!(call_ok("isNull", &[Value::Null]), Value::Bool(true));
    assert_eq!(call_ok("isBool", &[n(1.0)]), Value::Bool(false));
}

#[test]
fn conversions() {
    assert_eq!(call_ok("toString", &[n(3.0)]), s("3"));
    assert_eq!(call_ok("toNumber", &[s("4.5")]), n(4.5));
    assert_eq!(call_ok("toBool", &[s("")]), Value::Bool(false));
    assert_eq!(call_ok("toJson", &[arr(&[n(1.0)])]), s("[1.0]"));
    assert_eq!(call_ok("fromJson", &[s("{\"a\": 1}")]).get_member("a"), n(1.0));
    assert_eq!(call_ok("fromJson", &[s("not json")]), Value::Null);
}

#[test]
fn null_fallbacks() {
    assert_eq!(call_ok("default", &[Value::Null, s("fb")]), s("fb"));
    assert_eq!(call_ok("default", &[n(0.0), s("fb")]), n(0.0));
    assert_eq!(call_ok("coalesce", &[Value::Null, Value::Null, n(1.0)]), n(1.0));
    assert_eq!(call_ok("coalesce", &[]), Value::Null);
}

#[test]
fn unknown_name_errors() {
    assert!(call("nope", &[], &fcx()).is_err());
}
