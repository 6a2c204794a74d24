// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn websocket_pipe_parses() {
    let p: PipeDef = serde_json::from_value(serde_json::json!({
        "type": "websocket",
        "url": "wss://stream.example.com/v1",
        "heartbeat": { "interval": "30s", "payload": { "op": "ping" } },
        "reconnect": { "max_attempts": 3, "delay": "50ms" },
    }))
    .unwrap();
    let PipeKind::Websocket(ws) = &p.kind else { panic!("expected websocket") };
    assert_eq!(ws.url, "wss://stream.example.com/v1");
    assert_eq!(ws.heartbeat.as_ref().unwrap().interval, "30s");
    let r = ws.reconnect.as_ref().unwrap();
    assert!(r.enabled);
    assert_eq!(r.max_attempts, 3);
    assert_eq!(r.delay, "50ms");
}

#[test]
fn mqtt_pipe_defaults() {
    let p: PipeDef = serde_json::from_value(serde_json::json!({
        "type": "mqtt",
        "host": "broker.local",
        "subscriptions": ["sensors/+/temperature", "sensors/#"],
    }))
    .unwrap();
    let PipeKind::Mqtt(m) = &p.kind else { panic!("expected mqtt") };
    assert_eq!(m.port, 1883);
    assert_eq!(m.qos, 0);
    assert_eq!(m.subscriptions.len(), 2);
}

#[yare::parameterized(
    tcp  = { serde_json::json!({ "type": "tcp", "host": "localhost", "port": 9000 }), "tcp" },
    udp  = { serde_json::json!({ "type": "udp", "broadcast": true }), "udp" },
    http = { serde_json::json!({ "type": "http", "base_url": "https://api.example.com" }), "http" },
    hook = { serde_json::json!({ "type": "webhook", "path": "/hooks/in" }), "webhook" },
)]
fn kinds_tag_correctly(doc: serde_json::Value, kind: &str) {
    let p: PipeDef = serde_json::from_value(doc).unwrap();
    assert_eq!(p.kind.kind_str(), kind);
}

#[test]
fn reconnect_defaults_are_spec_defaults() {
    let r = ReconnectDef::default();
    assert!(r.enabled);
    assert_eq!(r.max_attempts, 10);
    assert_eq!(r.delay, "5s");
}

#[test]
fn round_trips_with_type_tag() {
    let p: PipeDef = serde_json::from_value(serde_json::json!({
        "type": "tcp", "host": "h", "port": 1, "mode": "server",
    }))
    .unwrap();
    let json = serde_json::to_value(&p).unwrap();
    assert_eq!(json["type"], "tcp");
    let again: PipeDef = serde_json::from_value(json).unwrap();
    assert_eq!(p.kind, again.kind);
}
