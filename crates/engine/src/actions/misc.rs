// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Emit, logging, metrics, and locale actions

use crate::context::ActionContext;
use crate::registry::Outcome;
use crate::runtime::Runtime;
use weft_core::{Clock, Value, WeftError};
use weft_spec::ActionSpec;

pub(super) async fn emit<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let event = rt.required_str(action, "event", ctx)?;
    let data = rt.eval_arg(action, "data", ctx)?;
    rt.emit(&event, data).await;
    Ok(Outcome::done())
}

pub(super) async fn log<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let message = rt.eval_arg(action, "message", ctx)?.to_display_string();
    match action.get_str("level").unwrap_or("info") {
        "debug" => tracing::debug!(target: "weft::bot", "{message}"),
        "warn" => tracing::warn!(target: "weft::bot", "{message}"),
        "error" => tracing::error!(target: "weft::bot", "{message}"),
        _ => tracing::info!(target: "weft::bot", "{message}"),
    }
    Ok(Outcome::done())
}

pub(super) async fn metric_increment<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "name", ctx)?;
    let by = match rt.eval_arg(action, "by", ctx)? {
        Value::Null => 1.0,
        value => value.coerce_number(),
    };
    let labels = match rt.eval_arg(action, "labels", ctx)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| (k, v.to_display_string()))
            .collect::<Vec<(String, String)>>(),
        _ => Vec::new(),
    };
    let label_refs: Vec<(&str, &str)> =
        labels.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    rt.metrics().increment(&name, by, &label_refs);
    Ok(Outcome::done())
}

pub(super) async fn metric_gauge<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "name", ctx)?;
    let value = rt.eval_arg(action, "value", ctx)?.coerce_number();
    rt.metrics().set_gauge(&name, value);
    Ok(Outcome::done())
}

pub(super) async fn metric_record<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "name", ctx)?;
    let value = rt.eval_arg(action, "value", ctx)?.coerce_number();
    if value.is_nan() {
        return Err(WeftError::validation("metric_record requires a numeric 'value'"));
    }
    rt.metrics().record(&name, value);
    Ok(Outcome::done())
}

pub(super) async fn locale_get<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let key = rt.required_str(action, "key", ctx)?;
    let locale = action.get_str("locale").map(str::to_string);
    let params = match rt.eval_arg(action, "params", ctx)? {
        Value::Object(map) => Some(map),
        _ => None,
    };
    let text = rt.locale().get(&key, locale.as_deref(), params.as_ref());
    let alias = action.get_str("as").unwrap_or("text").to_string();
    ctx.set(alias, Value::String(text.clone()));
    Ok(Outcome::value(Value::String(text)))
}
