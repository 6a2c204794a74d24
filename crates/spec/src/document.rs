// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The top-level spec document
//!
//! The loader hands the runtime one validated, import-merged document.
//! Sections the core never interprets (identity, presence, theme, canvas,
//! …) are carried as opaque JSON for the adapter layers.

use crate::action::Actions;
use crate::command::CommandDef;
use crate::event::EventHandlerDef;
use crate::flow::FlowDef;
use crate::pipe::PipeDef;
use crate::schedule::SchedulerDef;
use crate::state::StateSchema;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weft_core::{ErrorCategory, Severity, WeftError};

/// One named permission level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PermissionLevelDef {
    #[serde(default)]
    pub level: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
}

/// One declared metric.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricDecl {
    #[serde(default)]
    pub help: String,
}

/// What the error handler does after routing callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorBehavior {
    #[default]
    Log,
    Throw,
    Silent,
}

/// The `errors` section: configuration for the runtime error handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPolicyDef {
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,
    /// When set, only these categories are routed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<ErrorCategory>>,
    /// Also emit a `runtime:error` event through the router.
    #[serde(default)]
    pub emit_events: bool,
    #[serde(default)]
    pub behavior: ErrorBehavior,
}

fn default_min_severity() -> Severity {
    Severity::Info
}

impl Default for ErrorPolicyDef {
    fn default() -> Self {
        Self {
            min_severity: Severity::Info,
            categories: None,
            emit_events: false,
            behavior: ErrorBehavior::Log,
        }
    }
}

/// The validated, immutable bot specification.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BotSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    // Opaque to the core; passed to the platform adapter.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub identity: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub presence: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub intents: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub gateway: serde_json::Value,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub permissions: IndexMap<String, PermissionLevelDef>,
    #[serde(default, skip_serializing_if = "StateSchema::is_empty")]
    pub state: StateSchema,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub commands: IndexMap<String, CommandDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventHandlerDef>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub flows: IndexMap<String, FlowDef>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub pipes: IndexMap<String, PipeDef>,
    #[serde(default, skip_serializing_if = "SchedulerDef::is_empty")]
    pub scheduler: SchedulerDef,
    /// Locale trees: locale code → nested string tables.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub locale: IndexMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metrics: IndexMap<String, MetricDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorPolicyDef>,

    // Remaining declarative tables the core hands to collaborators.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub components: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub embeds: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub theme: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub voice: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub automod: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub canvas: serde_json::Value,
}

impl BotSpec {
    /// Deserialize a validated document and inject map-key names.
    pub fn from_value(doc: serde_json::Value) -> Result<Self, WeftError> {
        let mut spec: BotSpec = serde_json::from_value(doc)
            .map_err(|e| WeftError::validation(format!("malformed spec document: {e}")))?;
        spec.hydrate();
        spec.validate()?;
        Ok(spec)
    }

    fn hydrate(&mut self) {
        let names: Vec<String> = self.commands.keys().cloned().collect();
        for name in names {
            if let Some(cmd) = self.commands.get_mut(&name) {
                cmd.hydrate(&name);
            }
        }
        for (name, flow) in &mut self.flows {
            flow.name = name.clone();
        }
        for (name, pipe) in &mut self.pipes {
            pipe.name = name.clone();
        }
        self.state.hydrate();
    }

    /// Referential rules the schema cannot express.
    fn validate(&self) -> Result<(), WeftError> {
        for handler in &self.events {
            handler.validate()?;
            for action in handler.actions.iter() {
                if let Some(eh) = &action.error_handler {
                    if !self.flows.contains_key(eh) {
                        return Err(WeftError::validation(format!(
                            "error_handler references unknown flow '{eh}'"
                        )));
                    }
                }
            }
        }
        for job in &self.scheduler.jobs {
            if job.name.is_empty() {
                return Err(WeftError::validation("scheduler job with empty name"));
            }
        }
        Ok(())
    }

    pub fn flow(&self, name: &str) -> Option<&FlowDef> {
        self.flows.get(name)
    }

    pub fn command(&self, name: &str) -> Option<&CommandDef> {
        self.commands.get(name)
    }

    pub fn pipe(&self, name: &str) -> Option<&PipeDef> {
        self.pipes.get(name)
    }

    /// All handlers listening on `event`, in declaration order.
    pub fn handlers_for(&self, event: &str) -> impl Iterator<Item = &EventHandlerDef> + '_ {
        let event = event.to_string();
        self.events.iter().filter(move |h| h.event == event)
    }
}

impl StateSchema {
    fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.tables.is_empty()
    }
}

impl SchedulerDef {
    fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// A command's flat action list is sometimes needed where only the name is
/// known; resolve through subcommand paths like `tags add`.
pub fn resolve_command_actions<'a>(
    spec: &'a BotSpec,
    path: &[&str],
) -> Option<&'a Actions> {
    let cmd = spec.command(path.first()?)?;
    match path {
        [_] => Some(&cmd.actions),
        [_, sub] => cmd
            .subcommands
            .get(*sub)
            .map(|s| &s.actions)
            .or_else(|| cmd.groups.values().find_map(|g| g.subcommands.get(*sub).map(|s| &s.actions))),
        [_, group, sub] => cmd.groups.get(*group).and_then(|g| g.subcommands.get(*sub)).map(|s| &s.actions),
        _ => None,
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
