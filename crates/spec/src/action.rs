// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action records: the unit of interpreted behavior
//!
//! An action is a tagged record: an `action` discriminator plus
//! action-specific fields, kept as raw JSON until the registered handler
//! parses them. Two meta-fields apply to every action: `when` gates
//! execution, `error_handler` names a flow invoked on failure.

use crate::condition::Condition;
use serde::{Deserialize, Serialize};

/// One action in an action list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Discriminator into the action registry.
    pub action: String,
    /// Condition gating execution; a falsy result skips the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    /// Flow to invoke on failure; swallows the error from the sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_handler: Option<String>,
    /// Action-specific fields, parsed by the handler.
    #[serde(flatten)]
    pub args: serde_json::Map<String, serde_json::Value>,
}

impl ActionSpec {
    pub fn new(action: impl Into<String>) -> Self {
        Self { action: action.into(), when: None, error_handler: None, args: Default::default() }
    }

    /// Builder-style argument for tests and programmatic specs.
    pub fn arg(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.args.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(|v| v.as_str())
    }
}

/// A normalized action list. Accepts a single action or a list in the
/// document; always serializes as a list.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Actions(pub Vec<ActionSpec>);

impl Actions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionSpec> {
        self.0.iter()
    }
}

impl From<Vec<ActionSpec>> for Actions {
    fn from(v: Vec<ActionSpec>) -> Self {
        Actions(v)
    }
}

impl<'de> Deserialize<'de> for Actions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            Many(Vec<ActionSpec>),
            One(Box<ActionSpec>),
        }
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::Many(v) => Actions(v),
            OneOrMany::One(a) => Actions(vec![*a]),
        })
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
