// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Moderation, role, and channel lifecycle actions
//!
//! All of these need a guild id from the trigger context; running one in
//! a guild-less context is a scope violation, reported loudly.

use crate::context::ActionContext;
use crate::registry::Outcome;
use crate::runtime::Runtime;
use weft_core::{parse_duration, Clock, RuntimeErrorKind, Value, WeftError};
use weft_spec::ActionSpec;

fn guild_id(ctx: &ActionContext) -> Result<String, WeftError> {
    ctx.scope().guild_id.ok_or_else(|| {
        WeftError::runtime(RuntimeErrorKind::ScopeViolation, "action requires a guild in context")
    })
}

fn optional_reason<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &ActionContext,
) -> Result<Option<String>, WeftError> {
    let value = rt.eval_arg(action, "reason", ctx)?;
    Ok(if value.is_null() { None } else { Some(value.to_display_string()) })
}

pub(super) async fn kick<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let guild = guild_id(ctx)?;
    let user = rt.required_str(action, "user", ctx)?;
    let reason = optional_reason(rt, action, ctx)?;
    rt.platform().kick(&guild, &user, reason.as_deref()).await?;
    Ok(Outcome::done())
}

pub(super) async fn ban<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let guild = guild_id(ctx)?;
    let user = rt.required_str(action, "user", ctx)?;
    let reason = optional_reason(rt, action, ctx)?;
    rt.platform().ban(&guild, &user, reason.as_deref()).await?;
    Ok(Outcome::done())
}

pub(super) async fn timeout<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let guild = guild_id(ctx)?;
    let user = rt.required_str(action, "user", ctx)?;
    let duration_text = rt.required_str(action, "duration", ctx)?;
    let duration = parse_duration(&duration_text).ok_or_else(|| {
        WeftError::validation(format!("timeout: bad duration '{duration_text}'"))
    })?;
    let until_ms = rt.clock().epoch_ms() + duration.as_millis() as u64;
    let reason = optional_reason(rt, action, ctx)?;
    rt.platform().timeout(&guild, &user, until_ms, reason.as_deref()).await?;
    Ok(Outcome::done())
}

pub(super) async fn add_role<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let guild = guild_id(ctx)?;
    let user = rt.required_str(action, "user", ctx)?;
    let role = rt.required_str(action, "role", ctx)?;
    rt.platform().add_role(&guild, &user, &role).await?;
    Ok(Outcome::done())
}

pub(super) async fn remove_role<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let guild = guild_id(ctx)?;
    let user = rt.required_str(action, "user", ctx)?;
    let role = rt.required_str(action, "role", ctx)?;
    rt.platform().remove_role(&guild, &user, &role).await?;
    Ok(Outcome::done())
}

pub(super) async fn create_role<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let guild = guild_id(ctx)?;
    let mut payload = indexmap::IndexMap::new();
    for key in ["name", "color", "permissions", "hoist", "mentionable"] {
        let value = rt.eval_arg(action, key, ctx)?;
        if !value.is_null() {
            payload.insert(key.to_string(), value);
        }
    }
    let role = rt.platform().create_role(&guild, Value::Object(payload)).await?;
    if let Some(alias) = action.get_str("as") {
        ctx.set(alias.to_string(), role.clone());
    }
    Ok(Outcome::value(role))
}

pub(super) async fn delete_role<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let guild = guild_id(ctx)?;
    let role = rt.required_str(action, "role", ctx)?;
    rt.platform().delete_role(&guild, &role).await?;
    Ok(Outcome::done())
}

pub(super) async fn create_channel<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let guild = guild_id(ctx)?;
    let mut payload = indexmap::IndexMap::new();
    for key in ["name", "kind", "topic", "category", "nsfw"] {
        let value = rt.eval_arg(action, key, ctx)?;
        if !value.is_null() {
            payload.insert(key.to_string(), value);
        }
    }
    let channel = rt.platform().create_channel(&guild, Value::Object(payload)).await?;
    if let Some(alias) = action.get_str("as") {
        ctx.set(alias.to_string(), channel.clone());
    }
    Ok(Outcome::value(channel))
}

pub(super) async fn delete_channel<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let channel = rt.required_str(action, "channel", ctx)?;
    rt.platform().delete_channel(&channel).await?;
    Ok(Outcome::done())
}
