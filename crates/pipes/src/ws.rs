// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket pipe
//!
//! One supervisor task per pipe owns the socket: it connects, splits the
//! stream, pumps inbound frames into events, writes outbound frames from
//! a submission channel, beats the heartbeat while connected, and runs the
//! linear reconnect loop on unexpected close. Text frames are JSON-decoded
//! when possible; a decoded object's `event` (or `type`) field names the
//! logical event, everything else arrives as `message`.

use crate::lifecycle::{Lifecycle, PipeState, Reconnector};
use crate::overlay::RequestOverlay;
use crate::{Pipe, PipeEvent};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use weft_core::{parse_duration, Value, WeftError};
use weft_spec::WsPipeDef;

pub struct WsPipe {
    shared: Arc<Shared>,
}

struct Shared {
    name: String,
    def: WsPipeDef,
    lifecycle: Lifecycle,
    reconnector: Reconnector,
    overlay: RequestOverlay,
    event_tx: mpsc::Sender<PipeEvent>,
    writer: Mutex<Option<mpsc::Sender<Message>>>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl WsPipe {
    pub fn new(name: impl Into<String>, def: WsPipeDef, event_tx: mpsc::Sender<PipeEvent>) -> Self {
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
                cancel: Mutex::new(None),
            }),
        }
    }
}

#[async_trait]
impl Pipe for WsPipe {
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
        // Explicit connect resets the attempt budget
        self.shared.reconnector.reset();
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { supervisor(shared, token).await });
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(token) = self.shared.cancel.lock().take() {
            token.cancel();
        }
        self.shared.lifecycle.close();
        *self.shared.writer.lock() = None;
        self.shared.overlay.clear();
    }

    async fn send(&self, data: Value) -> Result<(), WeftError> {
        let tx = self
            .shared
            .writer
            .lock()
            .clone()
            .ok_or_else(|| WeftError::Transport(format!("pipe '{}' not connected", self.shared.name)))?;
        tx.send(encode_frame(&data))
            .await
            .map_err(|_| WeftError::Transport(format!("pipe '{}' write loop gone", self.shared.name)))
    }

    async fn request(
        &self,
        data: Value,
        timeout: Duration,
        response_event: Option<String>,
    ) -> Result<Value, WeftError> {
        let event = response_event.unwrap_or_else(|| "message".to_string());
        let rx = self.shared.overlay.register(&event);
        self.send(data).await?;
        self.shared.overlay.await_response(rx, timeout).await
    }
}

async fn supervisor(shared: Arc<Shared>, token: CancellationToken) {
    loop {
        if token.is_cancelled() || shared.lifecycle.is_closed() {
            return;
        }
        shared.lifecycle.transition(PipeState::Connecting);

        let request = match build_request(&shared.def) {
            Ok(request) => request,
            Err(e) => {
                shared.lifecycle.transition(PipeState::Disconnected);
                emit(&shared, "error", text_object("message", &e.to_string())).await;
                return;
            }
        };
        match tokio_tungstenite::connect_async(request).await {
            Ok((stream, _)) => {
                shared.reconnector.reset();
                shared.lifecycle.transition(PipeState::Connected);
                emit(&shared, "open", Value::Null).await;
                run_connection(&shared, stream, &token).await;
                *shared.writer.lock() = None;
                shared.overlay.clear();
                shared.lifecycle.transition(PipeState::Disconnected);
                emit(&shared, "close", Value::Null).await;
            }
            Err(e) => {
                tracing::warn!(pipe = %shared.name, %e, "ws connect failed");
                shared.lifecycle.transition(PipeState::Disconnected);
                emit(&shared, "error", text_object("message", &e.to_string())).await;
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

/// Serve one live connection until close, error, or cancellation.
async fn run_connection(
    shared: &Arc<Shared>,
    stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    token: &CancellationToken,
) {
    let (mut sink, mut read) = stream.split();
    let (write_tx, mut write_rx) = mpsc::channel::<Message>(64);
    *shared.writer.lock() = Some(write_tx);

    let heartbeat = shared
        .def
        .heartbeat
        .as_ref()
        .and_then(|hb| parse_duration(&hb.interval).map(|d| (d, hb.payload.clone())))
        .filter(|(d, _)| !d.is_zero());
    let mut beat = heartbeat.as_ref().map(|(d, _)| tokio::time::interval(*d));
    if let Some(interval) = beat.as_mut() {
        // First tick fires immediately; skip it so beats start one period in
        interval.tick().await;
    }

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let value = decode_text(&text);
                        let event = event_name(&value);
                        shared.overlay.resolve(&event, &value);
                        emit(shared, &event, value).await;
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        let value = Value::Bytes(bytes.to_vec());
                        shared.overlay.resolve("message", &value);
                        emit(shared, "message", value).await;
                    }
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Err(e)) => {
                        tracing::warn!(pipe = %shared.name, %e, "ws read error");
                        emit(shared, "error", text_object("message", &e.to_string())).await;
                        return;
                    }
                    _ => {} // Ping/Pong — the library answers for us
                }
            }
            outbound = write_rx.recv() => {
                match outbound {
                    Some(message) => {
                        if let Err(e) = sink.send(message).await {
                            tracing::warn!(pipe = %shared.name, %e, "ws write error");
                            return;
                        }
                    }
                    None => return,
                }
            }
            _ = async { if let Some(interval) = beat.as_mut() { interval.tick().await; } else { std::future::pending::<tokio::time::Instant>().await; } } => {
                if let Some((_, payload)) = &heartbeat {
                    let frame = encode_frame(&Value::from_json(payload.clone()));
                    if sink.send(frame).await.is_err() {
                        return;
                    }
                }
            }
            _ = token.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return;
            }
        }
    }
}

async fn emit(shared: &Arc<Shared>, event: &str, data: Value) {
    let _ = shared
        .event_tx
        .send(PipeEvent { pipe: shared.name.clone(), event: event.to_string(), data })
        .await;
}

/// Client request with any configured extra headers applied.
fn build_request(
    def: &WsPipeDef,
) -> Result<tokio_tungstenite::tungstenite::handshake::client::Request, WeftError> {
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    let mut request = def
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| WeftError::Transport(format!("bad websocket url: {e}")))?;
    for (name, value) in &def.headers {
        let name = name
            .parse::<tokio_tungstenite::tungstenite::http::HeaderName>()
            .map_err(|e| WeftError::Transport(format!("bad header '{name}': {e}")))?;
        let value = value
            .parse()
            .map_err(|_| WeftError::Transport(format!("bad header value for '{name:?}'")))?;
        request.headers_mut().insert(name, value);
    }
    Ok(request)
}

fn text_object(key: &str, value: &str) -> Value {
    let mut map = indexmap::IndexMap::new();
    map.insert(key.to_string(), Value::String(value.to_string()));
    Value::Object(map)
}

/// JSON-decode when possible, else the raw text.
fn decode_text(text: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from_json)
        .unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Logical event of a decoded frame: its `event`/`type` field, else
/// `message`.
fn event_name(value: &Value) -> String {
    for key in ["event", "type"] {
        if let Value::String(s) = value.get_member(key) {
            return s;
        }
    }
    "message".to_string()
}

fn encode_frame(data: &Value) -> Message {
    match data {
        Value::String(s) => Message::Text(s.clone().into()),
        Value::Bytes(b) => Message::Binary(b.clone().into()),
        other => Message::Text(
            serde_json::to_string(&other.to_json()).unwrap_or_default().into(),
        ),
    }
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
