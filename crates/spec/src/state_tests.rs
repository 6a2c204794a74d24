// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn variables_parse_with_scopes_and_defaults() {
    let mut s: StateSchema = serde_json::from_value(serde_json::json!({
        "variables": {
            "xp": { "type": "number", "scope": "member", "default": 0 },
            "prefix": { "type": "string", "scope": "guild", "default": "!", "ttl": "1h" },
            "session": { "scope": "user", "persist": false },
        },
    }))
    .unwrap();
    s.hydrate();
    let xp = s.variable("xp").unwrap();
    assert_eq!(xp.name, "xp");
    assert_eq!(xp.scope, Scope::Member);
    assert_eq!(xp.default, Some(serde_json::json!(0)));
    assert!(xp.persist);
    assert!(!s.variable("session").unwrap().persist);
    assert_eq!(s.variable("prefix").unwrap().ttl.as_deref(), Some("1h"));
}

#[test]
fn tables_parse_with_columns_and_indexes() {
    let mut s: StateSchema = serde_json::from_value(serde_json::json!({
        "tables": {
            "warnings": {
                "columns": {
                    "id": { "type": "string", "primary": true, "nullable": false },
                    "guild_id": { "type": "string", "index": true },
                    "count": { "type": "number", "default": 0 },
                    "meta": { "type": "json" },
                },
                "composite_indexes": [["guild_id", "count"]],
            },
        },
    }))
    .unwrap();
    s.hydrate();
    let t = s.table("warnings").unwrap();
    assert_eq!(t.name, "warnings");
    assert!(t.columns["id"].primary);
    assert!(!t.columns["id"].nullable);
    assert!(t.columns["guild_id"].index);
    assert_eq!(t.columns["meta"].column_type, ColumnType::Json);
    assert_eq!(t.composite_indexes, vec![vec!["guild_id".to_string(), "count".to_string()]]);
}

#[test]
fn column_order_is_preserved() {
    let s: StateSchema = serde_json::from_value(serde_json::json!({
        "tables": {
            "t": { "columns": { "b": {}, "a": {}, "z": {} } },
        },
    }))
    .unwrap();
    let cols: Vec<_> = s.tables["t"].columns.keys().cloned().collect();
    assert_eq!(cols, vec!["b", "a", "z"]);
}
