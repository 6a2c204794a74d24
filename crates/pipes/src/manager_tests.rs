// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use weft_core::Value;

fn defs(doc: serde_json::Value) -> IndexMap<String, PipeDef> {
    let mut map: IndexMap<String, PipeDef> = serde_json::from_value(doc).unwrap();
    for (name, def) in &mut map {
        def.name = name.clone();
    }
    map
}

#[tokio::test]
async fn builds_transport_pipes_and_flags_external_ones() {
    let (manager, _rx) = PipeManager::build(&defs(serde_json::json!({
        "stream": { "type": "websocket", "url": "ws://localhost:1" },
        "broker": { "type": "mqtt", "host": "localhost" },
        "raw": { "type": "tcp", "host": "localhost", "port": 1 },
        "beacon": { "type": "udp", "broadcast": true },
        "api": { "type": "http", "base_url": "http://localhost" },
        "inbound": { "type": "webhook", "path": "/hook" },
    })));

    let mut names = manager.names();
    names.sort_unstable();
    assert_eq!(names, vec!["beacon", "broker", "raw", "stream"]);

    assert!(manager.pipe("stream").is_ok());
    let err = manager.pipe("api").unwrap_err();
    assert!(err.to_string().contains("adapter-served"));
    assert!(manager.pipe("missing").is_err());
}

#[tokio::test]
async fn shutdown_closes_every_pipe() {
    let (manager, _rx) = PipeManager::build(&defs(serde_json::json!({
        "beacon": { "type": "udp", "bind": "127.0.0.1:0", "broadcast": false },
    })));
    let pipe = manager.pipe("beacon").unwrap();
    pipe.connect().await.unwrap();
    assert_eq!(pipe.state(), crate::PipeState::Connected);

    manager.shutdown().await;
    assert_eq!(pipe.state(), crate::PipeState::Closed);

    // Closed pipes reject further traffic
    assert!(pipe.send(Value::String("x".into())).await.is_err());
}

#[tokio::test]
async fn events_from_all_pipes_share_one_channel() {
    let (manager, mut rx) = PipeManager::build(&defs(serde_json::json!({
        "a": { "type": "udp", "bind": "127.0.0.1:0" },
        "b": { "type": "udp", "bind": "127.0.0.1:0" },
    })));
    manager.connect_all().await;

    let mut seen = std::collections::HashSet::new();
    for _ in 0..2 {
        let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event, "open");
        seen.insert(event.pipe);
    }
    assert_eq!(seen.len(), 2);
    manager.shutdown().await;
}
