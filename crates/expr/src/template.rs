// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `${...}` template interpolation
//!
//! Scanning is depth-counting, not regex: an embedded expression may
//! contain `}` inside object literals or strings, so the scanner tracks
//! brace depth and quote state to find the matching close.

use crate::{Evaluator, Vars};
use weft_core::{ExpressionError, Value};

#[derive(Debug, PartialEq)]
enum Segment {
    Text(String),
    Expr(String),
}

/// Interpolate every `${expr}` occurrence, forcing string conversion.
pub(crate) fn interpolate(
    ev: &Evaluator,
    template: &str,
    ctx: &dyn Vars,
) -> Result<String, ExpressionError> {
    let segments = scan(ev, template)?;
    let mut out = String::with_capacity(template.len());
    for segment in segments {
        match segment {
            Segment::Text(t) => out.push_str(&t),
            Segment::Expr(src) => out.push_str(&ev.evaluate(&src, ctx)?.to_display_string()),
        }
    }
    Ok(out)
}

/// Evaluate a template, returning the raw value when the whole string is a
/// single bare `${expr}`.
pub(crate) fn evaluate_template(
    ev: &Evaluator,
    template: &str,
    ctx: &dyn Vars,
) -> Result<Value, ExpressionError> {
    let segments = scan(ev, template)?;
    if let [Segment::Expr(src)] = segments.as_slice() {
        return ev.evaluate(src, ctx);
    }
    let mut out = String::with_capacity(template.len());
    for segment in segments {
        match segment {
            Segment::Text(t) => out.push_str(&t),
            Segment::Expr(src) => out.push_str(&ev.evaluate(&src, ctx)?.to_display_string()),
        }
    }
    Ok(Value::String(out))
}

/// Evaluate a condition string to a boolean.
///
/// A single bare `${expr}` evaluates raw and takes its truthiness. A mixed
/// template (`"${user.level} > 3"`) splices each placeholder's value back
/// into the source as a *literal* (strings quoted, numbers bare) and
/// evaluates the spliced expression, so comparisons read naturally. A
/// string with no placeholders is evaluated as a bare expression.
pub(crate) fn evaluate_condition(
    ev: &Evaluator,
    source: &str,
    ctx: &dyn Vars,
) -> Result<bool, ExpressionError> {
    let segments = scan(ev, source)?;
    if let [Segment::Expr(src)] = segments.as_slice() {
        return Ok(ev.evaluate(src, ctx)?.is_truthy());
    }
    if segments.iter().all(|s| matches!(s, Segment::Text(_))) {
        return Ok(ev.evaluate(source, ctx)?.is_truthy());
    }
    let mut spliced = String::with_capacity(source.len());
    for segment in segments {
        match segment {
            Segment::Text(t) => spliced.push_str(&t),
            Segment::Expr(src) => spliced.push_str(&to_literal(&ev.evaluate(&src, ctx)?)),
        }
    }
    Ok(ev.evaluate(&spliced, ctx)?.is_truthy())
}

/// Render a value as expression-source text.
fn to_literal(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_finite() {
                format!("{n}")
            } else {
                // No literal form; divide-by-zero reproduces the value
                "(0/0)".to_string()
            }
        }
        Value::String(s) => {
            format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
        }
        // Containers have no stable literal splice; compare via single-bare
        other => format!("'{}'", other.to_display_string().replace('\\', "\\\\").replace('\'', "\\'")),
    }
}

fn scan(ev: &Evaluator, template: &str) -> Result<Vec<Segment>, ExpressionError> {
    if template.len() > ev.max_source_len() {
        return Err(ExpressionError::limit(format!(
            "template longer than {} bytes",
            ev.max_source_len()
        )));
    }

    let mut segments = Vec::new();
    let mut text = String::new();
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        text.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = find_close(after)
            .ok_or_else(|| ExpressionError::parse(format!("unterminated ${{ in '{template}'")))?;
        if !text.is_empty() {
            segments.push(Segment::Text(std::mem::take(&mut text)));
        }
        segments.push(Segment::Expr(after[..end].to_string()));
        rest = &after[end + 1..];
    }
    text.push_str(rest);
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

/// Byte offset of the `}` closing the expression that starts at the string
/// head, accounting for nested braces and quoted strings.
fn find_close(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "condition_tests.rs"]
mod condition_tests;
