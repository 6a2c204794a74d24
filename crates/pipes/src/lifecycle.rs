// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared pipe lifecycle and reconnection policy
//!
//! ```text
//!   new ──connect()──▶ connecting ──success──▶ connected
//!     ▲                    │                       │
//!     │             failure│                       │ send allowed
//!     │                    ▼                       │
//!     └─backoff◀──── disconnected ◀──close/error───┘
//!                          │
//!                     disconnect()
//!                          ▼
//!                        closed (terminal)
//! ```

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use weft_core::parse_duration_or;
use weft_spec::ReconnectDef;

/// Default reconnect delay when the configured literal is unparseable.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Closed,
}

impl PipeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipeState::New => "new",
            PipeState::Connecting => "connecting",
            PipeState::Connected => "connected",
            PipeState::Disconnected => "disconnected",
            PipeState::Closed => "closed",
        }
    }
}

/// Shared, observable lifecycle state. `Closed` is sticky: once closed, no
/// transition leaves it.
#[derive(Debug)]
pub struct Lifecycle {
    state: Mutex<PipeState>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self { state: Mutex::new(PipeState::New) }
    }

    pub fn state(&self) -> PipeState {
        *self.state.lock()
    }

    /// Transition unless already closed; returns false when closed.
    pub fn transition(&self, to: PipeState) -> bool {
        let mut state = self.state.lock();
        if *state == PipeState::Closed {
            return false;
        }
        *state = to;
        true
    }

    pub fn close(&self) {
        *self.state.lock() = PipeState::Closed;
    }

    pub fn is_closed(&self) -> bool {
        self.state() == PipeState::Closed
    }

    pub fn is_connected(&self) -> bool {
        self.state() == PipeState::Connected
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Linear reconnect policy: fixed delay between attempts, bounded count.
///
/// An explicit `connect()` resets the counter; exhaustion is signalled
/// exactly once per exhaustion cycle.
#[derive(Debug)]
pub struct Reconnector {
    enabled: bool,
    max_attempts: u32,
    delay: Duration,
    attempts: AtomicU32,
}

impl Reconnector {
    pub fn new(def: Option<&ReconnectDef>) -> Self {
        match def {
            Some(def) => Self {
                enabled: def.enabled,
                max_attempts: def.max_attempts,
                delay: parse_duration_or(&def.delay, DEFAULT_RECONNECT_DELAY),
                attempts: AtomicU32::new(0),
            },
            None => Self {
                enabled: false,
                max_attempts: 0,
                delay: DEFAULT_RECONNECT_DELAY,
                attempts: AtomicU32::new(0),
            },
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Account one failed attempt. `Some(delay)` means retry after the
    /// delay; `None` means give up (disabled or exhausted).
    pub fn next_attempt(&self) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let used = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if used > self.max_attempts {
            None
        } else {
            Some(self.delay)
        }
    }

    /// Reset on explicit connect or after a successful connection.
    pub fn reset(&self) {
        self.attempts.store(0, Ordering::SeqCst);
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
