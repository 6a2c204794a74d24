// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! weft-pipes: long-lived external connections
//!
//! A pipe is a named connection with a shared lifecycle (new → connecting
//! → connected → disconnected → closed), optional linear-backoff
//! reconnection, and a transport-specific contract: WebSocket, MQTT, TCP
//! (client or server), UDP. Pipes are single-owner: the framework's tasks
//! hold the sockets; callers talk to a pipe through its named operations,
//! and inbound traffic arrives as [`PipeEvent`]s on one channel the
//! runtime drains.

pub mod lifecycle;
pub mod manager;
pub mod mqtt;
pub mod overlay;
pub mod tcp;
pub mod topic;
pub mod udp;
pub mod ws;

use async_trait::async_trait;
use std::time::Duration;
use weft_core::{Value, WeftError};

pub use lifecycle::{Lifecycle, PipeState, Reconnector};
pub use manager::PipeManager;
pub use overlay::RequestOverlay;
pub use topic::topic_matches;

/// One inbound occurrence on a pipe, forwarded to the event router as
/// `pipe:<pipe>:<event>`.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeEvent {
    pub pipe: String,
    /// `open`, `close`, `error`, `reconnect_failed`, `message`, `data`,
    /// `connection`, or a matched MQTT subscription pattern.
    pub event: String,
    pub data: Value,
}

/// The transport-agnostic pipe surface.
#[async_trait]
pub trait Pipe: Send + Sync {
    fn name(&self) -> &str;
    fn state(&self) -> PipeState;

    /// Begin connecting (resets the reconnect attempt counter). Returns
    /// once the connection task is started, not once connected; watch for
    /// the `open` event.
    async fn connect(&self) -> Result<(), WeftError>;

    /// Stop the pipe and cancel any reconnect loop. Terminal.
    async fn disconnect(&self);

    /// Transport-specific outbound submit. WebSocket: text/binary frame
    /// (objects JSON-encode). MQTT: `{topic, payload, qos?, retain?}`.
    /// TCP: raw bytes/text (server mode accepts `{addr?, data}`).
    /// UDP: datagram, `{host?, port?, data}` overrides the default target.
    async fn send(&self, data: Value) -> Result<(), WeftError>;

    /// Request/response overlay where the transport supports one.
    async fn request(
        &self,
        data: Value,
        timeout: Duration,
        response_event: Option<String>,
    ) -> Result<Value, WeftError>;

    /// Add a subscription (MQTT only).
    async fn subscribe(&self, pattern: &str) -> Result<(), WeftError> {
        let _ = pattern;
        Err(WeftError::validation(format!(
            "pipe '{}' does not support subscriptions",
            self.name()
        )))
    }
}

impl std::fmt::Debug for dyn Pipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipe")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}
