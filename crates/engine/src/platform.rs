// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform client contract
//!
//! The abstract capability surface a chat-platform adapter implements.
//! The runtime never sees protocol bytes; an action like `reply` becomes
//! one call here with JSON-shaped payloads, and the adapter translates.
//! At-least-once: the runtime retries nothing itself, and side effects of
//! a partially failed sequence remain visible.

use async_trait::async_trait;
use weft_core::{Value, WeftError};

#[async_trait]
pub trait PlatformClient: Send + Sync {
    // --- messages ---
    async fn send_message(&self, channel_id: &str, payload: Value) -> Result<Value, WeftError>;
    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: Value,
    ) -> Result<Value, WeftError>;
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), WeftError>;
    async fn bulk_delete(&self, channel_id: &str, count: u64) -> Result<u64, WeftError>;
    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), WeftError>;
    async fn remove_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), WeftError>;
    async fn send_dm(&self, user_id: &str, payload: Value) -> Result<Value, WeftError>;

    /// Reply to the interaction/message that triggered the dispatch.
    async fn reply(&self, interaction: Value, payload: Value) -> Result<Value, WeftError>;

    // --- moderation ---
    async fn kick(&self, guild_id: &str, user_id: &str, reason: Option<&str>)
        -> Result<(), WeftError>;
    async fn ban(&self, guild_id: &str, user_id: &str, reason: Option<&str>)
        -> Result<(), WeftError>;
    async fn timeout(
        &self,
        guild_id: &str,
        user_id: &str,
        until_ms: u64,
        reason: Option<&str>,
    ) -> Result<(), WeftError>;

    // --- roles ---
    async fn create_role(&self, guild_id: &str, payload: Value) -> Result<Value, WeftError>;
    async fn delete_role(&self, guild_id: &str, role_id: &str) -> Result<(), WeftError>;
    async fn add_role(&self, guild_id: &str, user_id: &str, role_id: &str)
        -> Result<(), WeftError>;
    async fn remove_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), WeftError>;

    // --- channels ---
    async fn create_channel(&self, guild_id: &str, payload: Value) -> Result<Value, WeftError>;
    async fn delete_channel(&self, channel_id: &str) -> Result<(), WeftError>;

    // --- fetches ---
    async fn fetch_guild(&self, guild_id: &str) -> Result<Value, WeftError>;
    async fn fetch_channel(&self, channel_id: &str) -> Result<Value, WeftError>;
    async fn fetch_user(&self, user_id: &str) -> Result<Value, WeftError>;
    async fn fetch_member(&self, guild_id: &str, user_id: &str) -> Result<Value, WeftError>;
}

/// Test double that records every call and answers with canned values.
#[cfg(any(test, feature = "test-support"))]
pub struct RecordingPlatform {
    calls: parking_lot::Mutex<Vec<(String, Value)>>,
    fail_next: parking_lot::Mutex<Option<String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingPlatform {
    pub fn new() -> Self {
        Self { calls: parking_lot::Mutex::new(Vec::new()), fail_next: parking_lot::Mutex::new(None) }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Make the next recorded call fail with an external error.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.fail_next.lock() = Some(message.into());
    }

    fn record(&self, name: &str, payload: Value) -> Result<(), WeftError> {
        self.calls.lock().push((name.to_string(), payload));
        if let Some(message) = self.fail_next.lock().take() {
            return Err(WeftError::External(message));
        }
        Ok(())
    }

    fn ok_value(&self, name: &str, payload: Value) -> Result<Value, WeftError> {
        self.record(name, payload)?;
        let mut map = indexmap::IndexMap::new();
        map.insert("id".to_string(), Value::String(format!("{name}-id")));
        Ok(Value::Object(map))
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl PlatformClient for RecordingPlatform {
    async fn send_message(&self, channel_id: &str, payload: Value) -> Result<Value, WeftError> {
        self.ok_value("send_message", tagged(channel_id, payload))
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: Value,
    ) -> Result<Value, WeftError> {
        self.ok_value("edit_message", tagged(&format!("{channel_id}/{message_id}"), payload))
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), WeftError> {
        self.record("delete_message", Value::String(format!("{channel_id}/{message_id}")))
    }

    async fn bulk_delete(&self, channel_id: &str, count: u64) -> Result<u64, WeftError> {
        self.record("bulk_delete", Value::String(format!("{channel_id}/{count}")))?;
        Ok(count)
    }

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), WeftError> {
        self.record("add_reaction", Value::String(format!("{channel_id}/{message_id}/{emoji}")))
    }

    async fn remove_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), WeftError> {
        self.record("remove_reaction", Value::String(format!("{channel_id}/{message_id}/{emoji}")))
    }

    async fn send_dm(&self, user_id: &str, payload: Value) -> Result<Value, WeftError> {
        self.ok_value("send_dm", tagged(user_id, payload))
    }

    async fn reply(&self, _interaction: Value, payload: Value) -> Result<Value, WeftError> {
        self.ok_value("reply", payload)
    }

    async fn kick(
        &self,
        guild_id: &str,
        user_id: &str,
        _reason: Option<&str>,
    ) -> Result<(), WeftError> {
        self.record("kick", Value::String(format!("{guild_id}/{user_id}")))
    }

    async fn ban(
        &self,
        guild_id: &str,
        user_id: &str,
        _reason: Option<&str>,
    ) -> Result<(), WeftError> {
        self.record("ban", Value::String(format!("{guild_id}/{user_id}")))
    }

    async fn timeout(
        &self,
        guild_id: &str,
        user_id: &str,
        until_ms: u64,
        _reason: Option<&str>,
    ) -> Result<(), WeftError> {
        self.record("timeout", Value::String(format!("{guild_id}/{user_id}/{until_ms}")))
    }

    async fn create_role(&self, guild_id: &str, payload: Value) -> Result<Value, WeftError> {
        self.ok_value("create_role", tagged(guild_id, payload))
    }

    async fn delete_role(&self, guild_id: &str, role_id: &str) -> Result<(), WeftError> {
        self.record("delete_role", Value::String(format!("{guild_id}/{role_id}")))
    }

    async fn add_role(&self, guild_id: &str, user_id: &str, role_id: &str) -> Result<(), WeftError> {
        self.record("add_role", Value::String(format!("{guild_id}/{user_id}/{role_id}")))
    }

    async fn remove_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), WeftError> {
        self.record("remove_role", Value::String(format!("{guild_id}/{user_id}/{role_id}")))
    }

    async fn create_channel(&self, guild_id: &str, payload: Value) -> Result<Value, WeftError> {
        self.ok_value("create_channel", tagged(guild_id, payload))
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), WeftError> {
        self.record("delete_channel", Value::String(channel_id.to_string()))
    }

    async fn fetch_guild(&self, guild_id: &str) -> Result<Value, WeftError> {
        self.ok_value("fetch_guild", Value::String(guild_id.to_string()))
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Value, WeftError> {
        self.ok_value("fetch_channel", Value::String(channel_id.to_string()))
    }

    async fn fetch_user(&self, user_id: &str) -> Result<Value, WeftError> {
        self.ok_value("fetch_user", Value::String(user_id.to_string()))
    }

    async fn fetch_member(&self, guild_id: &str, user_id: &str) -> Result<Value, WeftError> {
        self.ok_value("fetch_member", Value::String(format!("{guild_id}/{user_id}")))
    }
}

#[cfg(any(test, feature = "test-support"))]
fn tagged(target: &str, payload: Value) -> Value {
    let mut map = indexmap::IndexMap::new();
    map.insert("target".to_string(), Value::String(target.to_string()));
    map.insert("payload".to_string(), payload);
    Value::Object(map)
}
