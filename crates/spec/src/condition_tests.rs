// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn bare_string_is_an_expression() {
    let c: Condition = serde_json::from_value(serde_json::json!("${x} > 3")).unwrap();
    assert_eq!(c, Condition::Str("${x} > 3".into()));
}

#[test]
fn combinators_nest() {
    let c: Condition = serde_json::from_value(serde_json::json!({
        "all": [
            "${a}",
            { "any": [ "${b}", { "not": "${c}" } ] },
            { "expr": "${d} == 1" },
        ]
    }))
    .unwrap();
    let Condition::All { all } = &c else { panic!("expected all") };
    assert_eq!(all.len(), 3);
    assert_eq!(c.expressions(), vec!["${a}", "${b}", "${c}", "${d} == 1"]);
}

#[test]
fn round_trips() {
    let c = Condition::Any {
        any: vec![
            Condition::expr("${x}"),
            Condition::Not { not: Box::new(Condition::Expr { expr: "${y}".into() }) },
        ],
    };
    let json = serde_json::to_value(&c).unwrap();
    let back: Condition = serde_json::from_value(json).unwrap();
    assert_eq!(c, back);
}
