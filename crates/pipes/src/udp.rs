// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UDP pipe: datagram send/receive
//!
//! Connectionless, so there is no reconnect loop and `connected` simply
//! means "socket bound". Optional multicast group membership and broadcast
//! flag. Inbound datagrams arrive as `message` events with the sender
//! address attached.

use crate::lifecycle::{Lifecycle, PipeState};
use crate::{Pipe, PipeEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use weft_core::{Value, WeftError};
use weft_spec::UdpPipeDef;

const MAX_DATAGRAM: usize = 64 * 1024;

pub struct UdpPipe {
    shared: Arc<Shared>,
}

struct Shared {
    name: String,
    def: UdpPipeDef,
    lifecycle: Lifecycle,
    event_tx: mpsc::Sender<PipeEvent>,
    socket: Mutex<Option<Arc<UdpSocket>>>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl UdpPipe {
    pub fn new(name: impl Into<String>, def: UdpPipeDef, event_tx: mpsc::Sender<PipeEvent>) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                def,
                lifecycle: Lifecycle::new(),
                event_tx,
                socket: Mutex::new(None),
                cancel: Mutex::new(None),
            }),
        }
    }

    /// Bound local address (tests bind port 0).
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.shared.socket.lock().as_ref().and_then(|s| s.local_addr().ok())
    }
}

#[async_trait]
impl Pipe for UdpPipe {
    fn name(&self) -> &str {
        &self.shared.name
    }

    fn state(&self) -> PipeState {
        self.shared.lifecycle.state()
    }

    async fn connect(&self) -> Result<(), WeftError> {
        if self.shared.lifecycle.is_closed() {
            return Err(WeftError::Transport(format!("pipe '{}' is closed", self.shared.name)));
        }
        self.shared.lifecycle.transition(PipeState::Connecting);

        let bind = self.shared.def.bind.clone().unwrap_or_else(|| "0.0.0.0:0".to_string());
        let socket = UdpSocket::bind(&bind)
            .await
            .map_err(|e| WeftError::Transport(format!("bind {bind}: {e}")))?;

        if self.shared.def.broadcast {
            socket
                .set_broadcast(true)
                .map_err(|e| WeftError::Transport(format!("broadcast flag: {e}")))?;
        }
        if let Some(group) = &self.shared.def.multicast {
            let group: Ipv4Addr = group
                .parse()
                .map_err(|_| WeftError::validation(format!("bad multicast group '{group}'")))?;
            socket
                .join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)
                .map_err(|e| WeftError::Transport(format!("join multicast: {e}")))?;
        }

        let socket = Arc::new(socket);
        *self.shared.socket.lock() = Some(Arc::clone(&socket));

        let token = CancellationToken::new();
        {
            let mut cancel = self.shared.cancel.lock();
            if let Some(previous) = cancel.take() {
                previous.cancel();
            }
            *cancel = Some(token.clone());
        }

        self.shared.lifecycle.transition(PipeState::Connected);
        emit(&self.shared, "open", Value::Null).await;

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { recv_loop(shared, socket, token).await });
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(token) = self.shared.cancel.lock().take() {
            token.cancel();
        }
        self.shared.lifecycle.close();
        *self.shared.socket.lock() = None;
    }

    async fn send(&self, data: Value) -> Result<(), WeftError> {
        let socket = self.shared.socket.lock().clone().ok_or_else(|| {
            WeftError::Transport(format!("pipe '{}' not bound", self.shared.name))
        })?;

        // `{host, port, data}` overrides the configured default target
        let (host, port, payload) = match &data {
            Value::Object(map) if map.contains_key("data") => (
                Some(data.get_member("host"))
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_display_string()),
                Some(data.get_member("port")).and_then(|v| v.as_number()).map(|p| p as u16),
                data.get_member("data"),
            ),
            other => (None, None, other.clone()),
        };
        let host = host
            .or_else(|| self.shared.def.host.clone())
            .ok_or_else(|| WeftError::validation(format!("pipe '{}' has no target host", self.shared.name)))?;
        let port = port
            .or(self.shared.def.port)
            .ok_or_else(|| WeftError::validation(format!("pipe '{}' has no target port", self.shared.name)))?;

        let bytes = match &payload {
            Value::String(s) => s.as_bytes().to_vec(),
            Value::Bytes(b) => b.clone(),
            other => serde_json::to_string(&other.to_json()).unwrap_or_default().into_bytes(),
        };
        socket
            .send_to(&bytes, (host.as_str(), port))
            .await
            .map_err(|e| WeftError::Transport(format!("udp send: {e}")))?;
        Ok(())
    }

    async fn request(
        &self,
        _data: Value,
        _timeout: Duration,
        _response_event: Option<String>,
    ) -> Result<Value, WeftError> {
        Err(WeftError::validation(format!(
            "pipe '{}': request/response is not defined for udp",
            self.shared.name
        )))
    }
}

async fn recv_loop(shared: Arc<Shared>, socket: Arc<UdpSocket>, token: CancellationToken) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                match received {
                    Ok((n, addr)) => {
                        let data = match std::str::from_utf8(&buf[..n]) {
                            Ok(text) => Value::String(text.to_string()),
                            Err(_) => Value::Bytes(buf[..n].to_vec()),
                        };
                        let mut map = indexmap::IndexMap::new();
                        map.insert("data".to_string(), data);
                        map.insert("addr".to_string(), Value::String(addr.to_string()));
                        emit(&shared, "message", Value::Object(map)).await;
                    }
                    Err(e) => {
                        tracing::warn!(pipe = %shared.name, %e, "udp recv error");
                        emit(&shared, "error", Value::String(e.to_string())).await;
                        return;
                    }
                }
            }
            _ = token.cancelled() => return,
        }
    }
}

async fn emit(shared: &Arc<Shared>, event: &str, data: Value) {
    let _ = shared
        .event_tx
        .send(PipeEvent { pipe: shared.name.clone(), event: event.to_string(), data })
        .await;
}

#[cfg(test)]
#[path = "udp_tests.rs"]
mod tests;
