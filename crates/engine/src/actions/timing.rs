// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timing actions: wait, one-shot timers

use crate::context::ActionContext;
use crate::registry::Outcome;
use crate::runtime::Runtime;
use weft_core::{parse_duration, Clock, WeftError};
use weft_spec::ActionSpec;

pub(super) async fn wait<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let text = rt.required_str(action, "duration", ctx)?;
    let duration = parse_duration(&text)
        .ok_or_else(|| WeftError::validation(format!("wait: bad duration '{text}'")))?;
    tokio::time::sleep(duration).await;
    Ok(Outcome::done())
}

pub(super) async fn create_timer<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let id = rt.required_str(action, "id", ctx)?;
    let text = rt.required_str(action, "duration", ctx)?;
    let duration = parse_duration(&text)
        .ok_or_else(|| WeftError::validation(format!("create_timer: bad duration '{text}'")))?;
    let event = rt.required_str(action, "event", ctx)?;
    let data = rt.eval_arg(action, "data", ctx)?;
    rt.set_timer(id, duration, event, data);
    Ok(Outcome::done())
}

pub(super) async fn cancel_timer<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let id = rt.required_str(action, "id", ctx)?;
    let cancelled = rt.cancel_timer(&id);
    Ok(Outcome::value(weft_core::Value::Bool(cancelled)))
}
