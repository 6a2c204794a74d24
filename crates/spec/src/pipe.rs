// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipe definitions: long-lived external connections
//!
//! Each pipe is named and tagged by transport `type`. The runtime's pipe
//! framework serves `websocket`, `mqtt`, `tcp`, and `udp`; `http` and
//! `webhook` parse here but are served by the platform adapter layer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    10
}

fn default_delay() -> String {
    "5s".to_string()
}

fn default_qos() -> u8 {
    0
}

/// Reconnection policy: fixed delay between attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectDef {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Duration literal; unparseable falls back to 5s.
    #[serde(default = "default_delay")]
    pub delay: String,
}

impl Default for ReconnectDef {
    fn default() -> Self {
        Self { enabled: true, max_attempts: 10, delay: "5s".to_string() }
    }
}

/// Periodic payload sent while connected (WebSocket).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatDef {
    /// Duration literal between beats.
    pub interval: String,
    /// Payload sent each beat (JSON-encoded when not a string).
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WsPipeDef {
    pub url: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<HeartbeatDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect: Option<ReconnectDef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MqttPipeDef {
    /// Broker host.
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Topics subscribed on connect; wildcards allowed.
    #[serde(default)]
    pub subscriptions: Vec<String>,
    #[serde(default = "default_qos")]
    pub qos: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect: Option<ReconnectDef>,
}

fn default_mqtt_port() -> u16 {
    1883
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TcpMode {
    #[default]
    Client,
    Server,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TcpPipeDef {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub mode: TcpMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect: Option<ReconnectDef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UdpPipeDef {
    /// Local bind address, `0.0.0.0:0` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Default send target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Multicast group to join.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multicast: Option<String>,
    #[serde(default)]
    pub broadcast: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HttpPipeDef {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WebhookPipeDef {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// Transport-specific configuration, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PipeKind {
    Http(HttpPipeDef),
    Webhook(WebhookPipeDef),
    Websocket(WsPipeDef),
    Mqtt(MqttPipeDef),
    Tcp(TcpPipeDef),
    Udp(UdpPipeDef),
}

impl PipeKind {
    pub fn kind_str(&self) -> &'static str {
        match self {
            PipeKind::Http(_) => "http",
            PipeKind::Webhook(_) => "webhook",
            PipeKind::Websocket(_) => "websocket",
            PipeKind::Mqtt(_) => "mqtt",
            PipeKind::Tcp(_) => "tcp",
            PipeKind::Udp(_) => "udp",
        }
    }

    /// Reconnect policy where the transport supports one.
    pub fn reconnect(&self) -> Option<&ReconnectDef> {
        match self {
            PipeKind::Websocket(ws) => ws.reconnect.as_ref(),
            PipeKind::Mqtt(m) => m.reconnect.as_ref(),
            PipeKind::Tcp(t) => t.reconnect.as_ref(),
            _ => None,
        }
    }
}

/// A named pipe declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeDef {
    /// Pipe name (injected from map key)
    #[serde(skip)]
    pub name: String,
    #[serde(flatten)]
    pub kind: PipeKind,
}

#[cfg(test)]
#[path = "pipe_tests.rs"]
mod tests;
