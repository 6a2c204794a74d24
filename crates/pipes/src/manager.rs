// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipe construction and lifecycle fan-out
//!
//! Builds every pipe a spec declares and funnels their events into one
//! channel the runtime drains. `http` and `webhook` pipes are declaration
//! data for the adapter layer; asking this framework for them is a
//! validation error.

use crate::mqtt::MqttPipe;
use crate::tcp::TcpPipe;
use crate::udp::UdpPipe;
use crate::ws::WsPipe;
use crate::{Pipe, PipeEvent};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use weft_core::WeftError;
use weft_spec::{PipeDef, PipeKind};

/// Size of the shared inbound event channel.
const EVENT_CHANNEL: usize = 256;

pub struct PipeManager {
    pipes: HashMap<String, Arc<dyn Pipe>>,
    /// Declared but adapter-served (`http` / `webhook`).
    external: Vec<String>,
}

impl PipeManager {
    /// Build pipes from the spec's declarations. The receiver carries every
    /// pipe's events; the runtime maps them to `pipe:<name>:<event>`.
    pub fn build(defs: &IndexMap<String, PipeDef>) -> (Self, mpsc::Receiver<PipeEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL);
        let mut pipes: HashMap<String, Arc<dyn Pipe>> = HashMap::new();
        let mut external = Vec::new();

        for (name, def) in defs {
            match &def.kind {
                PipeKind::Websocket(ws) => {
                    pipes.insert(
                        name.clone(),
                        Arc::new(WsPipe::new(name.clone(), ws.clone(), event_tx.clone())),
                    );
                }
                PipeKind::Mqtt(mqtt) => {
                    pipes.insert(
                        name.clone(),
                        Arc::new(MqttPipe::new(name.clone(), mqtt.clone(), event_tx.clone())),
                    );
                }
                PipeKind::Tcp(tcp) => {
                    pipes.insert(
                        name.clone(),
                        Arc::new(TcpPipe::new(name.clone(), tcp.clone(), event_tx.clone())),
                    );
                }
                PipeKind::Udp(udp) => {
                    pipes.insert(
                        name.clone(),
                        Arc::new(UdpPipe::new(name.clone(), udp.clone(), event_tx.clone())),
                    );
                }
                PipeKind::Http(_) | PipeKind::Webhook(_) => {
                    external.push(name.clone());
                }
            }
        }

        (Self { pipes, external }, event_rx)
    }

    /// Look up a pipe by name.
    pub fn pipe(&self, name: &str) -> Result<Arc<dyn Pipe>, WeftError> {
        if let Some(pipe) = self.pipes.get(name) {
            return Ok(Arc::clone(pipe));
        }
        if self.external.iter().any(|n| n == name) {
            return Err(WeftError::validation(format!(
                "pipe '{name}' is adapter-served (http/webhook), not a transport pipe"
            )));
        }
        Err(WeftError::validation(format!("unknown pipe '{name}'")))
    }

    /// Start every transport pipe. Individual failures are logged and do
    /// not stop the others (their reconnect loops own recovery).
    pub async fn connect_all(&self) {
        for (name, pipe) in &self.pipes {
            if let Err(e) = pipe.connect().await {
                tracing::warn!(pipe = %name, %e, "pipe connect failed");
            }
        }
    }

    /// Stop every pipe: cancels reconnect loops, heartbeats, and pending
    /// requests.
    pub async fn shutdown(&self) {
        for pipe in self.pipes.values() {
            pipe.disconnect().await;
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.pipes.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty() && self.external.is_empty()
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
