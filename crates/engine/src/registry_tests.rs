// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weft_core::SystemClock;

#[test]
fn unknown_action_is_a_validation_error() {
    let registry: ActionRegistry<SystemClock> = ActionRegistry::new();
    let err = registry.get("frobnicate").unwrap_err();
    assert!(matches!(err, WeftError::Validation(_)));
}

#[test]
fn registered_handlers_are_found() {
    let registry = crate::actions::builtin_registry::<SystemClock>();
    for name in ["reply", "set", "increment", "db_query", "pipe_send", "emit", "wait"] {
        assert!(registry.contains(name), "missing builtin '{name}'");
    }
    assert!(!registry.contains("flow_if"), "control actions are not registry entries");
}

async fn custom_ping<C: weft_core::Clock>(
    _runtime: &crate::runtime::Runtime<C>,
    _action: &weft_spec::ActionSpec,
    _ctx: &mut crate::context::ActionContext,
) -> Result<Outcome, WeftError> {
    Ok(Outcome::done())
}

#[test]
fn registration_extends_the_catalog() {
    let mut registry = crate::actions::builtin_registry::<SystemClock>();
    let before = registry.names().len();
    registry.register("custom_ping", crate::handler!(custom_ping));
    assert!(registry.contains("custom_ping"));
    assert_eq!(registry.names().len(), before + 1);
}

#[test]
fn signal_continue_detection() {
    assert!(Signal::Continue.is_continue());
    assert!(!Signal::Break.is_continue());
    assert!(!Signal::Abort { reason: None }.is_continue());
    assert!(!Signal::Return { value: None }.is_continue());
}

#[test]
fn outcome_constructors() {
    assert_eq!(Outcome::done().signal, Signal::Continue);
    let with_value = Outcome::value(weft_core::Value::Number(1.0));
    assert_eq!(with_value.value, Some(weft_core::Value::Number(1.0)));
    let aborted = Outcome::signal(Signal::Abort { reason: Some("stop".into()) });
    assert!(!aborted.signal.is_continue());
}
