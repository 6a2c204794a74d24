// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Evaluation/action context
//!
//! The read surface expressions see: trigger-derived keys (`guild`,
//! `channel`, `user`, `member`, `message`, `args`, `event`, …) plus every
//! scratch variable written by `set`, `db_query.as`, `call_flow.as`.
//! Contexts are copy-on-write per action list: a fork may shadow names,
//! and only keys it wrote merge back, so siblings never see each other's
//! writes unless a merge happened.

use indexmap::IndexMap;
use std::collections::HashSet;
use weft_core::{ScopeContext, Value};

#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    vars: IndexMap<String, Value>,
    /// Keys written since the last fork; the merge unit.
    written: HashSet<String>,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a trigger context from named entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self { vars: entries.into_iter().collect(), written: HashSet::new() }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Scratch write; visible to every later action in the same sequence.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        self.written.insert(name.clone());
        self.vars.insert(name, value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.written.insert(name.to_string());
        self.vars.shift_remove(name)
    }

    /// Child context for a branch: reads everything, starts with no writes
    /// of its own.
    pub fn fork(&self) -> Self {
        Self { vars: self.vars.clone(), written: HashSet::new() }
    }

    /// Fold a completed child's writes back in (parallel branches merge in
    /// declaration order; batch iterations never call this).
    pub fn merge(&mut self, child: &ActionContext) {
        for key in &child.written {
            match child.vars.get(key) {
                Some(value) => self.set(key.clone(), value.clone()),
                None => {
                    self.remove(key);
                }
            }
        }
    }

    /// Scope ids for state resolution, read from the conventional context
    /// shapes: `guild.id` / `guildId`, `channel.id` / `channelId`,
    /// `user.id` / `userId`.
    pub fn scope(&self) -> ScopeContext {
        let mut scope = ScopeContext::new();
        if let Some(id) = self.entity_id("guild", "guildId") {
            scope.guild_id = Some(id);
        }
        if let Some(id) = self.entity_id("channel", "channelId") {
            scope.channel_id = Some(id);
        }
        if let Some(id) = self.entity_id("user", "userId") {
            scope.user_id = Some(id);
        }
        scope
    }

    fn entity_id(&self, object_key: &str, id_key: &str) -> Option<String> {
        if let Some(obj) = self.vars.get(object_key) {
            let id = obj.get_member("id");
            if !id.is_null() {
                return Some(id.to_display_string());
            }
            if let Value::String(s) = obj {
                return Some(s.clone());
            }
        }
        match self.vars.get(id_key) {
            Some(Value::Null) | None => None,
            Some(v) => Some(v.to_display_string()),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }
}

impl weft_expr::Vars for ActionContext {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
