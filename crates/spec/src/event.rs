// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event handler definitions

use crate::action::Actions;
use crate::condition::Condition;
use serde::{Deserialize, Serialize};
use weft_core::WeftError;

/// One handler bound to an event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventHandlerDef {
    /// Event name this handler listens on (`message_create`, `member_join`,
    /// pipe and scheduler events included).
    pub event: String,
    /// Condition gating each dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    /// Collapse bursts: all emits within this window of the last emit run
    /// once, after the window, with the latest emit's context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce: Option<String>,
    /// First emit wins: runs immediately, later emits within the window are
    /// dropped. Mutually exclusive with `debounce`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<String>,
    /// Execute at most once across the router's lifetime.
    #[serde(default)]
    pub once: bool,
    pub actions: Actions,
}

impl EventHandlerDef {
    /// Referential checks the schema cannot express.
    pub fn validate(&self) -> Result<(), WeftError> {
        if self.debounce.is_some() && self.throttle.is_some() {
            return Err(WeftError::validation(format!(
                "handler for '{}' sets both debounce and throttle",
                self.event
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
