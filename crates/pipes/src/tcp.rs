// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP pipe: outbound client or accept-loop server
//!
//! Frames are raw read chunks (UTF-8 text arrives as strings, anything
//! else as bytes). The client mode carries the request/response overlay:
//! `request()` resolves on the next inbound frame, which is documented as
//! correct only for strictly request-response protocols.

use crate::lifecycle::{Lifecycle, PipeState, Reconnector};
use crate::overlay::RequestOverlay;
use crate::{Pipe, PipeEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use weft_core::{Value, WeftError};
use weft_spec::{TcpMode, TcpPipeDef};

const READ_BUF: usize = 8 * 1024;

pub struct TcpPipe {
    shared: Arc<Shared>,
}

struct Shared {
    name: String,
    def: TcpPipeDef,
    lifecycle: Lifecycle,
    reconnector: Reconnector,
    overlay: RequestOverlay,
    event_tx: mpsc::Sender<PipeEvent>,
    /// Client-mode writer.
    writer: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    /// Server-mode per-connection writers.
    conns: Mutex<HashMap<SocketAddr, mpsc::Sender<Vec<u8>>>>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl TcpPipe {
    pub fn new(name: impl Into<String>, def: TcpPipeDef, event_tx: mpsc::Sender<PipeEvent>) -> Self {
        let reconnector = Reconnector::new(def.reconnect.as_ref());
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                def,
                lifecycle: Lifecycle::new(),
                reconnector,
                overlay: RequestOverlay::new(),
                event_tx,
                writer: Mutex::new(None),
                conns: Mutex::new(HashMap::new()),
                cancel: Mutex::new(None),
            }),
        }
    }
}

#[async_trait]
impl Pipe for TcpPipe {
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
        let token = CancellationToken::new();
        {
            let mut cancel = self.shared.cancel.lock();
            if let Some(previous) = cancel.take() {
                previous.cancel();
            }
            *cancel = Some(token.clone());
        }
        self.shared.reconnector.reset();
        let shared = Arc::clone(&self.shared);
        match self.shared.def.mode {
            TcpMode::Client => {
                tokio::spawn(async move { client_supervisor(shared, token).await });
            }
            TcpMode::Server => {
                // Bind before returning so a bad address fails loudly
                let addr = format!("{}:{}", shared.def.host, shared.def.port);
                let listener = TcpListener::bind(&addr)
                    .await
                    .map_err(|e| WeftError::Transport(format!("bind {addr}: {e}")))?;
                shared.lifecycle.transition(PipeState::Connected);
                emit(&shared, "open", Value::Null).await;
                tokio::spawn(async move { server_loop(shared, listener, token).await });
            }
        }
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(token) = self.shared.cancel.lock().take() {
            token.cancel();
        }
        self.shared.lifecycle.close();
        *self.shared.writer.lock() = None;
        self.shared.conns.lock().clear();
        self.shared.overlay.clear();
    }

    async fn send(&self, data: Value) -> Result<(), WeftError> {
        match self.shared.def.mode {
            TcpMode::Client => {
                let tx = self.shared.writer.lock().clone().ok_or_else(|| {
                    WeftError::Transport(format!("pipe '{}' not connected", self.shared.name))
                })?;
                tx.send(encode_bytes(&data)).await.map_err(|_| {
                    WeftError::Transport(format!("pipe '{}' write loop gone", self.shared.name))
                })
            }
            TcpMode::Server => {
                // `{addr, data}` targets one connection; bare data fans out
                let (target, payload) = match &data {
                    Value::Object(map) if map.contains_key("addr") => {
                        let addr = data.get_member("addr").to_display_string();
                        (Some(addr), data.get_member("data"))
                    }
                    other => (None, other.clone()),
                };
                let bytes = encode_bytes(&payload);
                let conns = self.shared.conns.lock().clone();
                if conns.is_empty() {
                    return Err(WeftError::Transport(format!(
                        "pipe '{}' has no client connections",
                        self.shared.name
                    )));
                }
                for (addr, tx) in conns {
                    if target.as_deref().is_some_and(|t| t != addr.to_string()) {
                        continue;
                    }
                    let _ = tx.send(bytes.clone()).await;
                }
                Ok(())
            }
        }
    }

    async fn request(
        &self,
        data: Value,
        timeout: Duration,
        _response_event: Option<String>,
    ) -> Result<Value, WeftError> {
        if self.shared.def.mode == TcpMode::Server {
            return Err(WeftError::validation(format!(
                "pipe '{}': request() is client-mode only",
                self.shared.name
            )));
        }
        // Next frame wins
        let rx = self.shared.overlay.register("data");
        self.send(data).await?;
        self.shared.overlay.await_response(rx, timeout).await
    }
}

async fn client_supervisor(shared: Arc<Shared>, token: CancellationToken) {
    loop {
        if token.is_cancelled() || shared.lifecycle.is_closed() {
            return;
        }
        shared.lifecycle.transition(PipeState::Connecting);
        let addr = format!("{}:{}", shared.def.host, shared.def.port);

        match TcpStream::connect(&addr).await {
            Ok(stream) => {
                shared.reconnector.reset();
                shared.lifecycle.transition(PipeState::Connected);
                emit(&shared, "open", Value::Null).await;
                run_client_connection(&shared, stream, &token).await;
                *shared.writer.lock() = None;
                shared.overlay.clear();
                shared.lifecycle.transition(PipeState::Disconnected);
                emit(&shared, "close", Value::Null).await;
            }
            Err(e) => {
                tracing::warn!(pipe = %shared.name, %addr, %e, "tcp connect failed");
                shared.lifecycle.transition(PipeState::Disconnected);
                emit(&shared, "error", error_object(&e.to_string())).await;
            }
        }

        if token.is_cancelled() || shared.lifecycle.is_closed() {
            return;
        }
        match shared.reconnector.next_attempt() {
            Some(delay) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = token.cancelled() => return,
                }
            }
            None => {
                if shared.reconnector.enabled() {
                    emit(&shared, "reconnect_failed", Value::Null).await;
                }
                return;
            }
        }
    }
}

async fn run_client_connection(shared: &Arc<Shared>, stream: TcpStream, token: &CancellationToken) {
    let (mut read, mut write) = stream.into_split();
    let (write_tx, mut write_rx) = mpsc::channel::<Vec<u8>>(64);
    *shared.writer.lock() = Some(write_tx);

    let mut buf = vec![0u8; READ_BUF];
    loop {
        tokio::select! {
            read_result = read.read(&mut buf) => {
                match read_result {
                    Ok(0) => return,
                    Ok(n) => {
                        let value = decode_bytes(&buf[..n]);
                        shared.overlay.resolve("data", &value);
                        emit(shared, "data", value).await;
                    }
                    Err(e) => {
                        tracing::warn!(pipe = %shared.name, %e, "tcp read error");
                        emit(shared, "error", error_object(&e.to_string())).await;
                        return;
                    }
                }
            }
            outbound = write_rx.recv() => {
                match outbound {
                    Some(bytes) => {
                        if write.write_all(&bytes).await.is_err() {
                            return;
                        }
                    }
                    None => return,
                }
            }
            _ = token.cancelled() => return,
        }
    }
}

async fn server_loop(shared: Arc<Shared>, listener: TcpListener, token: CancellationToken) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        emit(&shared, "connection", addr_object(addr, Value::Null)).await;
                        let shared = Arc::clone(&shared);
                        let token = token.clone();
                        tokio::spawn(async move {
                            serve_connection(shared, stream, addr, token).await;
                        });
                    }
                    Err(e) => {
                        tracing::warn!(pipe = %shared.name, %e, "tcp accept error");
                    }
                }
            }
            _ = token.cancelled() => return,
        }
    }
}

async fn serve_connection(
    shared: Arc<Shared>,
    stream: TcpStream,
    addr: SocketAddr,
    token: CancellationToken,
) {
    let (mut read, mut write) = stream.into_split();
    let (write_tx, mut write_rx) = mpsc::channel::<Vec<u8>>(64);
    shared.conns.lock().insert(addr, write_tx);

    let mut buf = vec![0u8; READ_BUF];
    loop {
        tokio::select! {
            read_result = read.read(&mut buf) => {
                match read_result {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let value = decode_bytes(&buf[..n]);
                        emit(&shared, "data", addr_object(addr, value)).await;
                    }
                }
            }
            outbound = write_rx.recv() => {
                match outbound {
                    Some(bytes) => {
                        if write.write_all(&bytes).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = token.cancelled() => break,
        }
    }
    shared.conns.lock().remove(&addr);
    emit(&shared, "disconnection", addr_object(addr, Value::Null)).await;
}

async fn emit(shared: &Arc<Shared>, event: &str, data: Value) {
    let _ = shared
        .event_tx
        .send(PipeEvent { pipe: shared.name.clone(), event: event.to_string(), data })
        .await;
}

fn error_object(message: &str) -> Value {
    let mut map = indexmap::IndexMap::new();
    map.insert("message".to_string(), Value::String(message.to_string()));
    Value::Object(map)
}

fn addr_object(addr: SocketAddr, data: Value) -> Value {
    let mut map = indexmap::IndexMap::new();
    map.insert("addr".to_string(), Value::String(addr.to_string()));
    if !data.is_null() {
        map.insert("data".to_string(), data);
    }
    Value::Object(map)
}

/// UTF-8 text arrives as a string, everything else as bytes.
fn decode_bytes(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => Value::Bytes(bytes.to_vec()),
    }
}

fn encode_bytes(data: &Value) -> Vec<u8> {
    match data {
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Bytes(b) => b.clone(),
        other => serde_json::to_string(&other.to_json()).unwrap_or_default().into_bytes(),
    }
}

#[cfg(test)]
#[path = "tcp_tests.rs"]
mod tests;
