// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State mutation actions
//!
//! `set`/`delete` write declared state variables through the state
//! manager; undeclared names are scratch-only context writes. The
//! arithmetic and list actions require a declared variable (their
//! serialization guarantees live in the state manager). `db_*` actions
//! are the tabular surface.

use crate::context::ActionContext;
use crate::registry::Outcome;
use crate::runtime::Runtime;
use weft_core::{Clock, Value, WeftError};
use weft_spec::ActionSpec;
use weft_storage::{QueryOptions, Row};

fn is_declared<C: Clock>(rt: &Runtime<C>, name: &str) -> bool {
    rt.spec().state.variable(name).is_some()
}

pub(super) async fn set<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "name", ctx)?;
    let value = rt.eval_arg(action, "value", ctx)?;
    if is_declared(rt, &name) {
        rt.state().set(&name, value.clone(), &ctx.scope()).await?;
    }
    // Always visible to later actions in this sequence
    ctx.set(name, value);
    Ok(Outcome::done())
}

pub(super) async fn delete<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "name", ctx)?;
    let existed = if is_declared(rt, &name) {
        rt.state().delete(&name, &ctx.scope()).await?
    } else {
        false
    };
    ctx.remove(&name);
    Ok(Outcome::value(Value::Bool(existed)))
}

/// Read a declared variable into scratch (`as` defaults to the name).
pub(super) async fn state_get<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "name", ctx)?;
    let value = rt.state().get(&name, &ctx.scope()).await?;
    let alias = action.get_str("as").unwrap_or(&name).to_string();
    ctx.set(alias, value.clone());
    Ok(Outcome::value(value))
}

pub(super) async fn increment<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "name", ctx)?;
    let by = match rt.eval_arg(action, "by", ctx)? {
        Value::Null => 1.0,
        value => value.coerce_number(),
    };
    if by.is_nan() {
        return Err(WeftError::validation("increment 'by' must be numeric"));
    }
    let next = rt.state().increment(&name, by, &ctx.scope()).await?;
    if let Some(alias) = action.get_str("as") {
        ctx.set(alias.to_string(), Value::Number(next));
    }
    Ok(Outcome::value(Value::Number(next)))
}

pub(super) async fn decrement<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "name", ctx)?;
    let by = match rt.eval_arg(action, "by", ctx)? {
        Value::Null => 1.0,
        value => value.coerce_number(),
    };
    if by.is_nan() {
        return Err(WeftError::validation("decrement 'by' must be numeric"));
    }
    let next = rt.state().decrement(&name, by, &ctx.scope()).await?;
    if let Some(alias) = action.get_str("as") {
        ctx.set(alias.to_string(), Value::Number(next));
    }
    Ok(Outcome::value(Value::Number(next)))
}

pub(super) async fn list_push<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "name", ctx)?;
    let value = rt.eval_arg(action, "value", ctx)?;
    let len = rt.state().list_push(&name, value, &ctx.scope()).await?;
    Ok(Outcome::value(Value::Number(len as f64)))
}

pub(super) async fn list_remove<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let name = rt.required_str(action, "name", ctx)?;
    let value = rt.eval_arg(action, "value", ctx)?;
    let removed = rt.state().list_remove(&name, value, &ctx.scope()).await?;
    Ok(Outcome::value(Value::Bool(removed)))
}

fn value_to_row(value: Value, what: &str) -> Result<Row, WeftError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Row::new()),
        other => Err(WeftError::validation(format!(
            "{what} must be an object, got {}",
            other.type_tag()
        ))),
    }
}

pub(super) async fn db_insert<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let table = rt.required_str(action, "table", ctx)?;
    let row = value_to_row(rt.eval_arg(action, "data", ctx)?, "db_insert data")?;
    rt.state().table_insert(&table, row).await?;
    Ok(Outcome::done())
}

pub(super) async fn db_query<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let table = rt.required_str(action, "table", ctx)?;
    let filter = value_to_row(rt.eval_arg(action, "where", ctx)?, "db_query where")?;
    let select = match rt.eval_arg(action, "select", ctx)? {
        Value::Array(columns) => columns.iter().map(Value::to_display_string).collect(),
        Value::Null => Vec::new(),
        other => {
            return Err(WeftError::validation(format!(
                "db_query select must be an array, got {}",
                other.type_tag()
            )))
        }
    };
    let options = QueryOptions {
        filter,
        select,
        order_by: action.get_str("order_by").map(str::to_string),
        limit: action.get("limit").and_then(|v| v.as_u64()),
        offset: action.get("offset").and_then(|v| v.as_u64()),
    };
    let rows = rt.state().table_query(&table, options).await?;
    let value = Value::Array(rows.into_iter().map(Value::Object).collect());
    if let Some(alias) = action.get_str("as") {
        ctx.set(alias.to_string(), value.clone());
    }
    Ok(Outcome::value(value))
}

pub(super) async fn db_update<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let table = rt.required_str(action, "table", ctx)?;
    let filter = value_to_row(rt.eval_arg(action, "where", ctx)?, "db_update where")?;
    let patch = value_to_row(rt.eval_arg(action, "data", ctx)?, "db_update data")?;
    let count = rt.state().table_update(&table, filter, patch).await?;
    Ok(Outcome::value(Value::Number(count as f64)))
}

pub(super) async fn db_delete<C: Clock>(
    rt: &Runtime<C>,
    action: &ActionSpec,
    ctx: &mut ActionContext,
) -> Result<Outcome, WeftError> {
    let table = rt.required_str(action, "table", ctx)?;
    let filter = value_to_row(rt.eval_arg(action, "where", ctx)?, "db_delete where")?;
    let count = rt.state().table_delete(&table, filter).await?;
    Ok(Outcome::value(Value::Number(count as f64)))
}
