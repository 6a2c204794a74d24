// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler job definitions

use crate::action::Actions;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A cron-style scheduled job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDef {
    pub name: String,
    /// Standard cron expression, evaluated in `timezone`.
    pub cron: String,
    /// IANA zone name; UTC when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub actions: Actions,
}

/// The `scheduler` section of a spec document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchedulerDef {
    #[serde(default)]
    pub jobs: Vec<JobDef>,
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
