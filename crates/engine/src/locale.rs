// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locale manager
//!
//! Keyed string lookup with dotted paths (`commands.ban.name`). Traversal
//! returns the raw key when any segment misses or the leaf is not a
//! string. `{name}` placeholders substitute from params; unknown or null
//! params leave the placeholder intact. Fallback applies only when the
//! entire requested locale is absent, never per key.

use indexmap::IndexMap;
use weft_core::Value;

pub struct LocaleManager {
    locales: IndexMap<String, serde_json::Value>,
    default_locale: String,
}

impl LocaleManager {
    pub fn new(locales: IndexMap<String, serde_json::Value>, default_locale: impl Into<String>) -> Self {
        Self { locales, default_locale: default_locale.into() }
    }

    /// Look up a dotted key in `locale` (or the default locale), with
    /// `{name}` parameter interpolation.
    pub fn get(
        &self,
        key: &str,
        locale: Option<&str>,
        params: Option<&IndexMap<String, Value>>,
    ) -> String {
        let table = locale
            .and_then(|code| self.locales.get(code))
            .or_else(|| self.locales.get(&self.default_locale));
        let Some(table) = table else { return key.to_string() };

        let Some(text) = resolve(table, key) else { return key.to_string() };
        match params {
            Some(params) => interpolate(text, params),
            None => text.to_string(),
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn has_locale(&self, code: &str) -> bool {
        self.locales.contains_key(code)
    }
}

fn resolve<'a>(table: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    let mut node = table;
    for segment in key.split('.') {
        node = node.as_object()?.get(segment)?;
    }
    node.as_str()
}

fn interpolate(text: &str, params: &IndexMap<String, Value>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match params.get(name) {
                    Some(value) if !value.is_null() => out.push_str(&value.to_display_string()),
                    // Unknown or null params leave the placeholder intact
                    _ => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[path = "locale_tests.rs"]
mod tests;
