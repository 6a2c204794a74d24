// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MQTT 3.1.1 topic filter matching
//!
//! `+` matches exactly one level; `#` matches the remaining tail and is
//! only valid as the last level. A filter whose last level is `#` also
//! matches its own parent (`sport/#` matches `sport`).

/// Whether a topic filter matches a concrete topic.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/').peekable();
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            // Tail wildcard only counts in last position; it accepts zero
            // or more remaining levels, so "sport/#" matches "sport" too
            (Some("#"), _) => return filter_levels.peek().is_none(),
            (Some("+"), Some(_)) => continue,
            (Some(f), Some(t)) if f == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Whether a filter contains wildcards (exact filters dispatch first).
pub fn is_wildcard(filter: &str) -> bool {
    filter.split('/').any(|level| level == "+" || level == "#")
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
