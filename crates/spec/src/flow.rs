// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow definitions: named, parameterized action lists
//!
//! Flows are callable via `call_flow`, receive typed parameters, and may
//! `return` a value to the caller.

use crate::action::Actions;
use serde::{Deserialize, Serialize};
use weft_core::Value;

/// Declared value types for flow parameters and state variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Any,
    String,
    Number,
    Bool,
    Array,
    Object,
}

impl ValueType {
    /// Whether a runtime value satisfies this declared type. Null satisfies
    /// every type (absence is handled by `required`/defaults).
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (ValueType::Any, _) => true,
            (ValueType::String, Value::String(_)) => true,
            (ValueType::Number, Value::Number(_)) => true,
            (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::Array, Value::Array(_)) => true,
            (ValueType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Any => "any",
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Bool => "bool",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }
}

/// One declared flow parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowParam {
    pub name: String,
    #[serde(rename = "type", default)]
    pub param_type: ValueType,
    #[serde(default)]
    pub required: bool,
    /// Default applied when the caller omits the argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

/// A named, parameterized action list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowDef {
    /// Flow name (injected from map key)
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<FlowParam>,
    #[serde(default)]
    pub actions: Actions,
}

#[cfg(test)]
#[path = "flow_tests.rs"]
mod tests;
