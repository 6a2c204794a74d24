// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MQTT pipe
//!
//! The broker only sees plain subscriptions; wildcard routing happens in
//! the framework so exact-topic listeners dispatch before pattern
//! listeners, and each matched subscription fires exactly once per
//! message. Payloads are JSON-decoded when possible, else delivered as
//! raw bytes. Publish accepts strings, bytes, or JSON-encodable objects
//! with QoS and retain passed through.

use crate::lifecycle::{Lifecycle, PipeState, Reconnector};
use crate::overlay::RequestOverlay;
use crate::topic::{is_wildcard, topic_matches};
use crate::{Pipe, PipeEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use weft_core::{Value, WeftError};
use weft_spec::MqttPipeDef;

pub struct MqttPipe {
    shared: Arc<Shared>,
}

struct Shared {
    name: String,
    def: MqttPipeDef,
    lifecycle: Lifecycle,
    reconnector: Reconnector,
    overlay: RequestOverlay,
    event_tx: mpsc::Sender<PipeEvent>,
    client: Mutex<Option<AsyncClient>>,
    subscriptions: Mutex<Vec<String>>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl MqttPipe {
    pub fn new(
        name: impl Into<String>,
        def: MqttPipeDef,
        event_tx: mpsc::Sender<PipeEvent>,
    ) -> Self {
        let name = name.into();
        let reconnector = Reconnector::new(def.reconnect.as_ref());
        let subscriptions = def.subscriptions.clone();
        Self {
            shared: Arc::new(Shared {
                name,
                def,
                lifecycle: Lifecycle::new(),
                reconnector,
                overlay: RequestOverlay::new(),
                event_tx,
                client: Mutex::new(None),
                subscriptions: Mutex::new(subscriptions),
                cancel: Mutex::new(None),
            }),
        }
    }
}

#[async_trait]
impl Pipe for MqttPipe {
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
        tokio::spawn(async move { supervisor(shared, token).await });
        Ok(())
    }

    async fn disconnect(&self) {
        if let Some(token) = self.shared.cancel.lock().take() {
            token.cancel();
        }
        if let Some(client) = self.shared.client.lock().take() {
            let _ = client.try_disconnect();
        }
        self.shared.lifecycle.close();
        self.shared.overlay.clear();
    }

    /// Publish. Expects `{topic, payload, qos?, retain?}`.
    async fn send(&self, data: Value) -> Result<(), WeftError> {
        let client = self.shared.client.lock().clone().ok_or_else(|| {
            WeftError::Transport(format!("pipe '{}' not connected", self.shared.name))
        })?;
        let topic = match data.get_member("topic") {
            Value::String(t) => t,
            _ => return Err(WeftError::validation("mqtt publish requires a topic")),
        };
        let qos = data
            .get_member("qos")
            .as_number()
            .map(|q| q as u8)
            .unwrap_or(self.shared.def.qos);
        let retain = data.get_member("retain").as_bool().unwrap_or(false);
        let payload = encode_payload(&data.get_member("payload"));

        client
            .publish(topic, qos_level(qos), retain, payload)
            .await
            .map_err(|e| WeftError::Transport(format!("mqtt publish: {e}")))
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

    async fn subscribe(&self, pattern: &str) -> Result<(), WeftError> {
        {
            let mut subscriptions = self.shared.subscriptions.lock();
            if !subscriptions.iter().any(|s| s == pattern) {
                subscriptions.push(pattern.to_string());
            }
        }
        let client = self.shared.client.lock().clone();
        if let Some(client) = client {
            client
                .subscribe(pattern, qos_level(self.shared.def.qos))
                .await
                .map_err(|e| WeftError::Transport(format!("mqtt subscribe: {e}")))?;
        }
        Ok(())
    }
}

async fn supervisor(shared: Arc<Shared>, token: CancellationToken) {
    loop {
        if token.is_cancelled() || shared.lifecycle.is_closed() {
            return;
        }
        shared.lifecycle.transition(PipeState::Connecting);

        let mut options = MqttOptions::new(
            shared.def.client_id.clone().unwrap_or_else(|| format!("weft-{}", shared.name)),
            shared.def.host.clone(),
            shared.def.port,
        );
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) = (&shared.def.username, &shared.def.password) {
            options.set_credentials(username.clone(), password.clone());
        }

        let (client, mut eventloop) = AsyncClient::new(options, 64);
        *shared.client.lock() = Some(client.clone());

        let mut connected = false;
        loop {
            tokio::select! {
                polled = eventloop.poll() => {
                    match polled {
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            connected = true;
                            shared.reconnector.reset();
                            shared.lifecycle.transition(PipeState::Connected);
                            emit(&shared, "open", Value::Null).await;
                            let patterns = shared.subscriptions.lock().clone();
                            for pattern in patterns {
                                if let Err(e) =
                                    client.subscribe(&pattern, qos_level(shared.def.qos)).await
                                {
                                    tracing::warn!(pipe = %shared.name, %pattern, %e, "mqtt subscribe failed");
                                }
                            }
                        }
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            dispatch(&shared, &publish.topic, &publish.payload).await;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::warn!(pipe = %shared.name, %e, "mqtt connection error");
                            emit(&shared, "error", Value::String(e.to_string())).await;
                            break;
                        }
                    }
                }
                _ = token.cancelled() => {
                    let _ = client.try_disconnect();
                    return;
                }
            }
        }

        *shared.client.lock() = None;
        shared.overlay.clear();
        shared.lifecycle.transition(PipeState::Disconnected);
        if connected {
            emit(&shared, "close", Value::Null).await;
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

/// Route one inbound publish: exact-topic subscriptions first, then every
/// wildcard subscription whose pattern matches, each exactly once, plus
/// the generic `message` event.
async fn dispatch(shared: &Arc<Shared>, topic: &str, payload: &[u8]) {
    let value = message_object(topic, decode_payload(payload));
    let subscriptions = shared.subscriptions.lock().clone();
    for pattern in matched_patterns(&subscriptions, topic) {
        shared.overlay.resolve(&pattern, &value);
        emit(shared, &pattern, value.clone()).await;
    }
    shared.overlay.resolve("message", &value);
    emit(shared, "message", value).await;
}

/// Subscriptions matching a concrete topic: exact matches first, then
/// wildcard patterns, deduplicated in subscription order.
pub(crate) fn matched_patterns(subscriptions: &[String], topic: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for pattern in subscriptions.iter().filter(|p| !is_wildcard(p)) {
        if pattern == topic && !out.contains(pattern) {
            out.push(pattern.clone());
        }
    }
    for pattern in subscriptions.iter().filter(|p| is_wildcard(p)) {
        if topic_matches(pattern, topic) && !out.contains(pattern) {
            out.push(pattern.clone());
        }
    }
    out
}

/// JSON when it parses, raw bytes otherwise (text that is not JSON stays
/// a string).
pub(crate) fn decode_payload(payload: &[u8]) -> Value {
    if let Ok(text) = std::str::from_utf8(payload) {
        return serde_json::from_str::<serde_json::Value>(text)
            .map(Value::from_json)
            .unwrap_or_else(|_| Value::String(text.to_string()));
    }
    Value::Bytes(payload.to_vec())
}

pub(crate) fn encode_payload(payload: &Value) -> Vec<u8> {
    match payload {
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Bytes(b) => b.clone(),
        other => serde_json::to_string(&other.to_json()).unwrap_or_default().into_bytes(),
    }
}

fn qos_level(qos: u8) -> QoS {
    match qos {
        2 => QoS::ExactlyOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::AtMostOnce,
    }
}

fn message_object(topic: &str, payload: Value) -> Value {
    let mut map = indexmap::IndexMap::new();
    map.insert("topic".to_string(), Value::String(topic.to_string()));
    map.insert("payload".to_string(), payload);
    Value::Object(map)
}

async fn emit(shared: &Arc<Shared>, event: &str, data: Value) {
    let _ = shared
        .event_tx
        .send(PipeEvent { pipe: shared.name.clone(), event: event.to_string(), data })
        .await;
}

#[cfg(test)]
#[path = "mqtt_tests.rs"]
mod tests;
