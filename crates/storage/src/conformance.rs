// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared conformance suite
//!
//! Every backend must pass exactly these checks; the per-backend test
//! files only construct the adapter and delegate here.

use crate::adapter::{QueryOptions, Row, StorageAdapter, StoredValue};
use weft_core::{Clock, FakeClock, Value, WeftError};
use weft_spec::TableDef;

fn row(pairs: &[(&str, Value)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

fn users_table() -> TableDef {
    let mut def: TableDef = serde_json::from_value(serde_json::json!({
        "columns": {
            "id": { "type": "string", "primary": true, "nullable": false },
            "name": { "type": "string" },
            "score": { "type": "number", "default": 0 },
            "active": { "type": "bool" },
            "meta": { "type": "json" },
        },
    }))
    .unwrap();
    def.name = "users".to_string();
    def
}

pub(crate) async fn run_kv_suite(adapter: &dyn StorageAdapter, clock: &FakeClock) {
    let now = clock.epoch_ms();

    // set / get round-trip for each primitive and a structured value
    for (key, value) in [
        ("k_str", Value::String("hello".into())),
        ("k_num", Value::Number(2.5)),
        ("k_zero", Value::Number(0.0)),
        ("k_bool", Value::Bool(false)),
        ("k_null", Value::Null),
        ("k_arr", Value::Array(vec![Value::Number(1.0), Value::String("x".into())])),
    ] {
        adapter.set(key, StoredValue::new(value.clone(), now, None)).await.unwrap();
        let got = adapter.get(key).await.unwrap().unwrap();
        assert_eq!(got.value, value, "round trip for {key}");
        assert_eq!(got.type_tag, value.type_tag());
    }

    // has / delete
    assert!(adapter.has("k_str").await.unwrap());
    assert!(adapter.delete("k_str").await.unwrap());
    assert!(!adapter.has("k_str").await.unwrap());
    assert!(!adapter.delete("k_str").await.unwrap());

    // keys with glob
    let keys = adapter.keys(Some("k_n*")).await.unwrap();
    assert_eq!(keys, vec!["k_null".to_string(), "k_num".to_string()]);

    // TTL: entry expires and reads as absent, has() agrees
    adapter
        .set("k_ttl", StoredValue::new(Value::Number(7.0), clock.epoch_ms(), Some(1_000)))
        .await
        .unwrap();
    assert!(adapter.has("k_ttl").await.unwrap());
    clock.advance(std::time::Duration::from_millis(1_001));
    assert_eq!(adapter.get("k_ttl").await.unwrap(), None);
    assert!(!adapter.has("k_ttl").await.unwrap());

    // clear drops everything
    adapter.clear().await.unwrap();
    assert!(adapter.keys(None).await.unwrap().is_empty());
}

pub(crate) async fn run_table_suite(adapter: &dyn StorageAdapter) {
    adapter.create_table(&users_table()).await.unwrap();

    for (id, name, score, active) in
        [("u1", "ada", 10.0, true), ("u2", "bob", 5.0, false), ("u3", "cyd", 8.0, true)]
    {
        adapter
            .insert(
                "users",
                row(&[
                    ("id", Value::String(id.into())),
                    ("name", Value::String(name.into())),
                    ("score", Value::Number(score)),
                    ("active", Value::Bool(active)),
                    ("meta", Value::Null),
                ]),
            )
            .await
            .unwrap();
    }

    // filter
    let active = adapter
        .query(
            "users",
            QueryOptions { filter: row(&[("active", Value::Bool(true))]), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(active.len(), 2);

    // order + limit + offset
    let ordered = adapter
        .query(
            "users",
            QueryOptions {
                order_by: Some("score DESC".into()),
                limit: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ordered[0]["id"], Value::String("u1".into()));
    assert_eq!(ordered[1]["id"], Value::String("u3".into()));

    let paged = adapter
        .query(
            "users",
            QueryOptions {
                order_by: Some("score DESC".into()),
                limit: Some(2),
                offset: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0]["id"], Value::String("u2".into()));

    // malformed order_by is dropped, not an error
    let unordered = adapter
        .query(
            "users",
            QueryOptions { order_by: Some("score; DROP TABLE users".into()), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(unordered.len(), 3);

    // projection
    let named = adapter
        .query(
            "users",
            QueryOptions {
                select: vec!["name".into()],
                filter: row(&[("id", Value::String("u1".into()))]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(named[0].len(), 1);
    assert_eq!(named[0]["name"], Value::String("ada".into()));

    // update
    let n = adapter
        .update(
            "users",
            row(&[("id", Value::String("u2".into()))]),
            row(&[("score", Value::Number(99.0))]),
        )
        .await
        .unwrap();
    assert_eq!(n, 1);
    let u2 = adapter
        .query(
            "users",
            QueryOptions { filter: row(&[("id", Value::String("u2".into()))]), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(u2[0]["score"], Value::Number(99.0));

    // delete
    let n = adapter.delete_rows("users", row(&[("active", Value::Bool(true))])).await.unwrap();
    assert_eq!(n, 2);
    let rest = adapter.query("users", QueryOptions::default()).await.unwrap();
    assert_eq!(rest.len(), 1);
}

pub(crate) async fn run_injection_suite(adapter: &dyn StorageAdapter) {
    // Bad identifiers fail with ValidationError before any storage I/O
    let bad = "users; DROP TABLE users";
    assert!(matches!(
        adapter.insert(bad, Row::new()).await,
        Err(WeftError::Validation(_))
    ));
    assert!(matches!(
        adapter.query(bad, QueryOptions::default()).await,
        Err(WeftError::Validation(_))
    ));
    assert!(matches!(
        adapter
            .insert("users", row(&[("na\"me", Value::Null)]))
            .await,
        Err(WeftError::Validation(_))
    ));

    // Hostile *values* are inert: they travel through parameters
    adapter.create_table(&users_table()).await.unwrap();
    let hostile = "'; DROP TABLE users; --";
    adapter
        .insert(
            "users",
            row(&[("id", Value::String("h1".into())), ("name", Value::String(hostile.into()))]),
        )
        .await
        .unwrap();
    let got = adapter
        .query(
            "users",
            QueryOptions {
                filter: row(&[("name", Value::String(hostile.into()))]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0]["name"], Value::String(hostile.into()));
}
