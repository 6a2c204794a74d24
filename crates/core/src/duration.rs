// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compact duration literals and elapsed-time formatting
//!
//! Durations appear throughout the spec document as `"<n><unit>"` with a
//! single unit from `ms`, `s`, `m`, `h` (`"250ms"`, `"5s"`, `"10m"`).
//! Compound forms (`"1h30m"`) are accepted only by the seek/position
//! parser. Unparseable inputs fall back to a component-specific default.

use std::time::Duration;

/// Parse a single-unit duration literal.
///
/// Returns `None` for anything that is not exactly `<digits><unit>`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = s.split_at(split);
    if digits.is_empty() {
        return None;
    }
    let n: u64 = digits.parse().ok()?;
    match unit {
        "ms" => Some(Duration::from_millis(n)),
        "s" => Some(Duration::from_secs(n)),
        "m" => Some(Duration::from_secs(n * 60)),
        "h" => Some(Duration::from_secs(n * 3600)),
        _ => None,
    }
}

/// Parse a duration literal, falling back to `default` when unparseable.
pub fn parse_duration_or(s: &str, default: Duration) -> Duration {
    parse_duration(s).unwrap_or(default)
}

/// Parse a compound duration like `"1h30m"` or `"1m30s"`.
///
/// A sequence of `<n><unit>` segments with strictly decreasing units. A
/// single segment is also accepted, so this is a superset of
/// [`parse_duration`]. Used by the voice seek/position parser only.
pub fn parse_compound_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let mut total = Duration::ZERO;
    let mut rest = s;
    let mut last_rank = usize::MAX;
    while !rest.is_empty() {
        let split = rest.find(|c: char| !c.is_ascii_digit())?;
        if split == 0 {
            return None;
        }
        let digits = &rest[..split];
        let after = &rest[split..];
        let (unit, tail) = if let Some(t) = after.strip_prefix("ms") {
            ("ms", t)
        } else if let Some(t) = after.strip_prefix('h') {
            ("h", t)
        } else if let Some(t) = after.strip_prefix('m') {
            ("m", t)
        } else if let Some(t) = after.strip_prefix('s') {
            ("s", t)
        } else {
            return None;
        };
        let rank = match unit {
            "h" => 3,
            "m" => 2,
            "s" => 1,
            _ => 0,
        };
        if rank >= last_rank {
            return None;
        }
        last_rank = rank;
        let n: u64 = digits.parse().ok()?;
        total += match unit {
            "h" => Duration::from_secs(n * 3600),
            "m" => Duration::from_secs(n * 60),
            "s" => Duration::from_secs(n),
            _ => Duration::from_millis(n),
        };
        rest = tail;
    }
    Some(total)
}

/// Format elapsed milliseconds for logs: `850ms`, `2.5s`, `1m05s`, `2h03m`.
pub fn format_elapsed_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else if ms < 3_600_000 {
        format!("{}m{:02}s", ms / 60_000, (ms % 60_000) / 1000)
    } else {
        format!("{}h{:02}m", ms / 3_600_000, (ms % 3_600_000) / 60_000)
    }
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
