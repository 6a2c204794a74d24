// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State schema: scoped variables and named tables

use crate::flow::ValueType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weft_core::Scope;

fn default_true() -> bool {
    true
}

/// One declared scoped variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDef {
    /// Variable name (injected from map key)
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub var_type: ValueType,
    #[serde(default)]
    pub scope: Scope,
    /// Visible only while no stored value exists; a stored `0`, `""`, or
    /// `false` shadows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Per-write TTL as a duration literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    /// Whether writes go to durable storage (false keeps the variable
    /// memory-only).
    #[serde(default = "default_true")]
    pub persist: bool,
}

/// Column value types; storage maps them to backend-native types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Bool,
    Json,
}

/// One column of a declared table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnDef {
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub primary: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub index: bool,
    /// Emitted into DDL only for primitive values; complex defaults are
    /// skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

/// A named table definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name (injected from map key)
    #[serde(skip)]
    pub name: String,
    pub columns: IndexMap<String, ColumnDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub composite_indexes: Vec<Vec<String>>,
}

/// The whole `state` section of a spec document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateSchema {
    #[serde(default)]
    pub variables: IndexMap<String, VariableDef>,
    #[serde(default)]
    pub tables: IndexMap<String, TableDef>,
}

impl StateSchema {
    /// Inject map-key names after deserializing the section standalone
    /// (the full-document path does this automatically).
    pub fn hydrate(&mut self) {
        for (name, var) in &mut self.variables {
            var.name = name.clone();
        }
        for (name, table) in &mut self.tables {
            table.name = name.clone();
        }
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDef> {
        self.variables.get(name)
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
