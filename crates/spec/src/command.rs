// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command definitions: named invocable units with typed options

use crate::action::Actions;
use serde::{Deserialize, Serialize};

/// Platform-facing option types for command arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Attachment,
}

/// One typed option of a command or subcommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type", default)]
    pub option_type: OptionType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    /// Fixed choice list; values surface in `args` verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<serde_json::Value>,
}

/// A subcommand: its own options and action list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubcommandDef {
    /// Subcommand name (injected from map key)
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub actions: Actions,
}

/// A group of subcommands (one nesting level, per platform rules).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubcommandGroupDef {
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subcommands: indexmap::IndexMap<String, SubcommandDef>,
}

/// A named invocable unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandDef {
    /// Command name (injected from map key)
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default, skip_serializing_if = "indexmap::IndexMap::is_empty")]
    pub subcommands: indexmap::IndexMap<String, SubcommandDef>,
    #[serde(default, skip_serializing_if = "indexmap::IndexMap::is_empty")]
    pub groups: indexmap::IndexMap<String, SubcommandGroupDef>,
    /// Permission level name required to invoke.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(default)]
    pub actions: Actions,
}

impl CommandDef {
    /// Inject map-key names into nested definitions after deserialize.
    pub(crate) fn hydrate(&mut self, name: &str) {
        self.name = name.to_string();
        for (sub_name, sub) in &mut self.subcommands {
            sub.name = sub_name.clone();
        }
        for (group_name, group) in &mut self.groups {
            group.name = group_name.clone();
            for (sub_name, sub) in &mut group.subcommands {
                sub.name = sub_name.clone();
            }
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
