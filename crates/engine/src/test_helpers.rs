// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared construction helpers for engine tests

use crate::platform::RecordingPlatform;
use crate::runtime::{Runtime, RuntimeConfig};
use std::sync::Arc;
use weft_core::FakeClock;
use weft_spec::BotSpec;
use weft_storage::MemoryStorage;

pub(crate) struct TestRig {
    pub runtime: Runtime<FakeClock>,
    pub platform: Arc<RecordingPlatform>,
    pub clock: FakeClock,
}

/// Runtime over memory storage, a recording platform, and a fake clock.
pub(crate) fn rig(spec_doc: serde_json::Value) -> TestRig {
    let spec = BotSpec::from_value(spec_doc).expect("test spec must parse");
    let clock = FakeClock::new();
    let platform = Arc::new(RecordingPlatform::new());
    let storage = Arc::new(MemoryStorage::with_clock(clock.clone()));
    let runtime = Runtime::new(
        spec,
        storage,
        Arc::clone(&platform) as Arc<dyn crate::platform::PlatformClient>,
        clock.clone(),
        RuntimeConfig::default(),
    )
    .expect("test runtime must build");
    TestRig { runtime, platform, clock }
}

/// Parse an action list from JSON.
pub(crate) fn actions(doc: serde_json::Value) -> weft_spec::Actions {
    serde_json::from_value(doc).expect("test actions must parse")
}
