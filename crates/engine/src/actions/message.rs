// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message I/O actions

use crate::context::ActionContext;
use crate::registry::Outcome;
use crate::runtime::Runtime;
use weft_core::{Clock, Value, WeftError};
use weft_spec::ActionSpec;

/// Payload assembled from the conventional message fields.
fn message_payload<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &ActionContext,
) -> Result<Value, WeftError> {
    let mut map = indexmap::IndexMap::new();
    for key in ["content", "embed", "embeds", "components", "ephemeral", "tts"] {
        let value = rt.eval_arg(action, key, ctx)?;
        if !value.is_null() {
            map.insert(key.to_string(), value);
        }
    }
    Ok(Value::Object(map))
}

pub(super) async fn reply<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let interaction = ctx.get("interaction").cloned().unwrap_or(Value::Null);
    let payload = message_payload(rt, action, ctx)?;
    let message = rt.platform().reply(interaction, payload).await?;
    if let Some(alias) = action.get_str("as") {
        ctx.set(alias.to_string(), message.clone());
    }
    Ok(Outcome::value(message))
}

pub(super) async fn send_message<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let channel = rt.required_str(action, "channel", ctx)?;
    let payload = message_payload(rt, action, ctx)?;
    let message = rt.platform().send_message(&channel, payload).await?;
    if let Some(alias) = action.get_str("as") {
        ctx.set(alias.to_string(), message.clone());
    }
    Ok(Outcome::value(message))
}

pub(super) async fn edit_message<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let channel = rt.required_str(action, "channel", ctx)?;
    let message = rt.required_str(action, "message", ctx)?;
    let payload = message_payload(rt, action, ctx)?;
    let edited = rt.platform().edit_message(&channel, &message, payload).await?;
    Ok(Outcome::value(edited))
}

pub(super) async fn delete_message<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let channel = rt.required_str(action, "channel", ctx)?;
    let message = rt.required_str(action, "message", ctx)?;
    rt.platform().delete_message(&channel, &message).await?;
    Ok(Outcome::done())
}

pub(super) async fn bulk_delete<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let channel = rt.required_str(action, "channel", ctx)?;
    let count = rt.eval_arg(action, "count", ctx)?.coerce_number();
    if count.is_nan() || count < 1.0 {
        return Err(WeftError::validation("bulk_delete requires a positive 'count'"));
    }
    let deleted = rt.platform().bulk_delete(&channel, count as u64).await?;
    Ok(Outcome::value(Value::Number(deleted as f64)))
}

pub(super) async fn add_reaction<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let channel = rt.required_str(action, "channel", ctx)?;
    let message = rt.required_str(action, "message", ctx)?;
    let emoji = rt.required_str(action, "emoji", ctx)?;
    rt.platform().add_reaction(&channel, &message, &emoji).await?;
    Ok(Outcome::done())
}

pub(super) async fn remove_reaction<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let channel = rt.required_str(action, "channel", ctx)?;
    let message = rt.required_str(action, "message", ctx)?;
    let emoji = rt.required_str(action, "emoji", ctx)?;
    rt.platform().remove_reaction(&channel, &message, &emoji).await?;
    Ok(Outcome::done())
}

pub(super) async fn dm<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let user = rt.required_str(action, "user", ctx)?;
    let payload = message_payload(rt, action, ctx)?;
    let message = rt.platform().send_dm(&user, payload).await?;
    Ok(Outcome::value(message))
}
