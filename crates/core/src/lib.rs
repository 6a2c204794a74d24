// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! weft-core: shared foundation for the Weft bot runtime
//!
//! Holds the value model, clock abstraction, duration literals, the error
//! taxonomy, variable scopes, and the metrics collector. Everything here is
//! runtime-agnostic: no tokio, no I/O.

pub mod clock;
pub mod duration;
pub mod error;
pub mod metrics;
pub mod scope;
pub mod value;

pub use clock::{Clock, FakeClock, SystemClock};
pub use duration::{format_elapsed_ms, parse_compound_duration, parse_duration, parse_duration_or};
pub use error::{
    ErrorCategory, ExpressionError, ExpressionErrorKind, RuntimeErrorKind, Severity, WeftError,
};
pub use metrics::MetricsCollector;
pub use scope::{Scope, ScopeContext};
pub use value::Value;
