// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture: a full runtime over memory storage, a recording
//! platform, and a fake clock.

use std::sync::Arc;
use weft_core::FakeClock;
use weft_engine::{PlatformClient, RecordingPlatform, Runtime, RuntimeConfig};
use weft_spec::BotSpec;
use weft_storage::MemoryStorage;

pub struct Fixture {
    pub runtime: Runtime<FakeClock>,
    pub platform: Arc<RecordingPlatform>,
    pub clock: FakeClock,
}

pub fn fixture(spec_doc: serde_json::Value) -> Fixture {
    let spec = BotSpec::from_value(spec_doc).expect("spec must parse");
    let clock = FakeClock::new();
    let platform = Arc::new(RecordingPlatform::new());
    let storage = Arc::new(MemoryStorage::with_clock(clock.clone()));
    let runtime = Runtime::new(
        spec,
        storage,
        Arc::clone(&platform) as Arc<dyn PlatformClient>,
        clock.clone(),
        RuntimeConfig::default(),
    )
    .expect("runtime must build");
    Fixture { runtime, platform, clock }
}
