// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the runtime
//!
//! Every component failure surfaces as a [`WeftError`]. Categories and
//! severities drive routing in the engine's error handler; the variants
//! mirror how failures propagate: validation stops before I/O, storage
//! errors annotate retriability, transport errors trigger reconnection.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What went wrong while evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionErrorKind {
    Parse,
    Reference,
    Type,
    Limit,
}

/// Expression evaluation failure with a source excerpt for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expression {kind:?} error: {excerpt}")]
pub struct ExpressionError {
    pub kind: ExpressionErrorKind,
    pub excerpt: String,
}

impl ExpressionError {
    pub fn new(kind: ExpressionErrorKind, excerpt: impl Into<String>) -> Self {
        let mut excerpt = excerpt.into();
        // Keep excerpts log-sized; back off to a char boundary
        if excerpt.len() > 120 {
            let mut end = 120;
            while !excerpt.is_char_boundary(end) {
                end -= 1;
            }
            excerpt.truncate(end);
        }
        Self { kind, excerpt }
    }

    pub fn parse(excerpt: impl Into<String>) -> Self {
        Self::new(ExpressionErrorKind::Parse, excerpt)
    }

    pub fn reference(excerpt: impl Into<String>) -> Self {
        Self::new(ExpressionErrorKind::Reference, excerpt)
    }

    pub fn type_error(excerpt: impl Into<String>) -> Self {
        Self::new(ExpressionErrorKind::Type, excerpt)
    }

    pub fn limit(excerpt: impl Into<String>) -> Self {
        Self::new(ExpressionErrorKind::Limit, excerpt)
    }
}

/// Which action-semantics rule a runtime error violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeErrorKind {
    LoopBound,
    CallDepth,
    UnknownFlow,
    ScopeViolation,
    Deadline,
}

/// The unified error taxonomy (spec §7).
#[derive(Debug, Error)]
pub enum WeftError {
    /// Inputs violate the spec's schema or referential rules. Not retriable.
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// Action semantics violated (loop bound, unknown flow, scope rules).
    #[error("runtime error ({kind:?}): {message}")]
    Runtime { kind: RuntimeErrorKind, message: String },

    /// The storage adapter reported a failure; `retriable` is its hint.
    #[error("storage error: {message}")]
    Storage { message: String, retriable: bool },

    /// Pipe or platform transport failure; triggers reconnection where
    /// applicable.
    #[error("transport error: {0}")]
    Transport(String),

    /// A request/response overlay expired before a response arrived.
    #[error("request timed out after {waited_ms}ms")]
    RequestTimeout { waited_ms: u64 },

    /// Wrapped error from the platform adapter.
    #[error("external error: {0}")]
    External(String),
}

impl WeftError {
    pub fn validation(msg: impl Into<String>) -> Self {
        WeftError::Validation(msg.into())
    }

    pub fn runtime(kind: RuntimeErrorKind, msg: impl Into<String>) -> Self {
        WeftError::Runtime { kind, message: msg.into() }
    }

    pub fn storage(msg: impl Into<String>, retriable: bool) -> Self {
        WeftError::Storage { message: msg.into(), retriable }
    }

    /// Default category used when the call site does not supply one.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WeftError::Validation(_) => ErrorCategory::Parser,
            WeftError::Expression(_) => ErrorCategory::Expression,
            WeftError::Runtime { .. } => ErrorCategory::Action,
            WeftError::Storage { .. } => ErrorCategory::Database,
            WeftError::Transport(_) | WeftError::RequestTimeout { .. } => ErrorCategory::Pipe,
            WeftError::External(_) => ErrorCategory::Client,
        }
    }

    /// Whether retrying the same operation could succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            WeftError::Storage { retriable, .. } => *retriable,
            WeftError::Transport(_) | WeftError::RequestTimeout { .. } => true,
            _ => false,
        }
    }
}

impl Clone for WeftError {
    fn clone(&self) -> Self {
        match self {
            WeftError::Validation(m) => WeftError::Validation(m.clone()),
            WeftError::Expression(e) => WeftError::Expression(e.clone()),
            WeftError::Runtime { kind, message } => {
                WeftError::Runtime { kind: *kind, message: message.clone() }
            }
            WeftError::Storage { message, retriable } => {
                WeftError::Storage { message: message.clone(), retriable: *retriable }
            }
            WeftError::Transport(m) => WeftError::Transport(m.clone()),
            WeftError::RequestTimeout { waited_ms } => {
                WeftError::RequestTimeout { waited_ms: *waited_ms }
            }
            WeftError::External(m) => WeftError::External(m.clone()),
        }
    }
}

/// Closed category set for error routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Scheduler,
    Event,
    Action,
    Expression,
    Database,
    Voice,
    Client,
    Pipe,
    Parser,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Scheduler => "scheduler",
            ErrorCategory::Event => "event",
            ErrorCategory::Action => "action",
            ErrorCategory::Expression => "expression",
            ErrorCategory::Database => "database",
            ErrorCategory::Voice => "voice",
            ErrorCategory::Client => "client",
            ErrorCategory::Pipe => "pipe",
            ErrorCategory::Parser => "parser",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

/// Ordered severities: `Debug < Info < Warn < Error < Fatal`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
