// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipe actions
//!
//! User actions never touch sockets; they queue on the named pipe's
//! submission path.

use crate::context::ActionContext;
use crate::registry::Outcome;
use crate::runtime::Runtime;
use std::time::Duration;
use weft_core::{parse_duration_or, Clock, WeftError};
use weft_spec::ActionSpec;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) async fn pipe_send<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "pipe", ctx)?;
    let data = rt.eval_arg(action, "data", ctx)?;
    rt.pipes().pipe(&name)?.send(data).await?;
    Ok(Outcome::done())
}

pub(super) async fn pipe_request<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "pipe", ctx)?;
    let data = rt.eval_arg(action, "data", ctx)?;
    let timeout = action
        .get_str("timeout")
        .map(|t| parse_duration_or(t, DEFAULT_REQUEST_TIMEOUT))
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
    let response_event = action.get_str("response_event").map(str::to_string);

    let response = rt.pipes().pipe(&name)?.request(data, timeout, response_event).await?;
    if let Some(alias) = action.get_str("as") {
        ctx.set(alias.to_string(), response.clone());
    }
    Ok(Outcome::value(response))
}

pub(super) async fn pipe_connect<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "pipe", ctx)?;
    rt.pipes().pipe(&name)?.connect().await?;
    Ok(Outcome::done())
}

pub(super) async fn pipe_disconnect<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "pipe", ctx)?;
    rt.pipes().pipe(&name)?.disconnect().await;
    Ok(Outcome::done())
}
