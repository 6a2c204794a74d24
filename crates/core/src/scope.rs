// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Variable scopes and canonical storage keys
//!
//! A scoped variable maps to a key under the `var/` prefix:
//!
//! ```text
//! var/global/<name>
//! var/guild/<guildId>/<name>
//! var/channel/<channelId>/<name>
//! var/user/<userId>/<name>
//! var/member/<guildId>/<userId>/<name>
//! ```
//!
//! Reading or writing a scoped variable without the ids its scope requires
//! is a programming error and fails loudly (never silently coerced).

use crate::error::{RuntimeErrorKind, WeftError};
use serde::{Deserialize, Serialize};

/// The partitioning key space of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Global,
    Guild,
    Channel,
    User,
    Member,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Guild => "guild",
            Scope::Channel => "channel",
            Scope::User => "user",
            Scope::Member => "member",
        }
    }

    /// Build the canonical storage key for a variable in this scope.
    ///
    /// Fails with a scope-violation runtime error when the context lacks a
    /// required id.
    pub fn storage_key(&self, name: &str, ctx: &ScopeContext) -> Result<String, WeftError> {
        match self {
            Scope::Global => Ok(format!("var/global/{name}")),
            Scope::Guild => {
                let guild = ctx.require_guild(name)?;
                Ok(format!("var/guild/{guild}/{name}"))
            }
            Scope::Channel => {
                let channel = ctx.require_channel(name)?;
                Ok(format!("var/channel/{channel}/{name}"))
            }
            Scope::User => {
                let user = ctx.require_user(name)?;
                Ok(format!("var/user/{user}/{name}"))
            }
            Scope::Member => {
                let guild = ctx.require_guild(name)?;
                let user = ctx.require_user(name)?;
                Ok(format!("var/member/{guild}/{user}/{name}"))
            }
        }
    }

    /// Key prefix covering every variable of this scope for one entity,
    /// used by scope-entity cleanup (`var/guild/<id>/`).
    pub fn entity_prefix(&self, ctx: &ScopeContext) -> Option<String> {
        match self {
            Scope::Global => Some("var/global/".to_string()),
            Scope::Guild => ctx.guild_id.as_deref().map(|g| format!("var/guild/{g}/")),
            Scope::Channel => ctx.channel_id.as_deref().map(|c| format!("var/channel/{c}/")),
            Scope::User => ctx.user_id.as_deref().map(|u| format!("var/user/{u}/")),
            Scope::Member => match (ctx.guild_id.as_deref(), ctx.user_id.as_deref()) {
                (Some(g), Some(u)) => Some(format!("var/member/{g}/{u}/")),
                _ => None,
            },
        }
    }
}

/// The trigger-derived ids a scope resolution can draw on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeContext {
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    pub user_id: Option<String>,
}

impl ScopeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guild(mut self, id: impl Into<String>) -> Self {
        self.guild_id = Some(id.into());
        self
    }

    pub fn channel(mut self, id: impl Into<String>) -> Self {
        self.channel_id = Some(id.into());
        self
    }

    pub fn user(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    fn require_guild(&self, var: &str) -> Result<&str, WeftError> {
        self.guild_id.as_deref().ok_or_else(|| {
            WeftError::runtime(
                RuntimeErrorKind::ScopeViolation,
                format!("variable '{var}' requires a guild id in context"),
            )
        })
    }

    fn require_channel(&self, var: &str) -> Result<&str, WeftError> {
        self.channel_id.as_deref().ok_or_else(|| {
            WeftError::runtime(
                RuntimeErrorKind::ScopeViolation,
                format!("variable '{var}' requires a channel id in context"),
            )
        })
    }

    fn require_user(&self, var: &str) -> Result<&str, WeftError> {
        self.user_id.as_deref().ok_or_else(|| {
            WeftError::runtime(
                RuntimeErrorKind::ScopeViolation,
                format!("variable '{var}' requires a user id in context"),
            )
        })
    }
}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
