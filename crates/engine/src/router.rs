// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event router
//!
//! Holds `event name → ordered handler entries` and applies the gating
//! rules on emit: `when` condition, `once` (deactivated *before* running
//! so re-entrant emits cannot re-fire), `throttle` (first emit wins in
//! the window), `debounce` (delayed last-wins; the pending execution
//! captures the latest emit's context). The router is poll-based like the
//! scheduler: it never runs actions itself, it returns dispatch items and
//! deadlines and the runtime's pump drives it through the clock.

use crate::context::ActionContext;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use weft_core::{parse_duration_or, WeftError};
use weft_spec::{Actions, Condition, EventHandlerDef};

/// Default cap on handlers per event name.
pub const DEFAULT_EVENT_CAP: usize = 100;

/// One gated dispatch the runtime must execute as a sequence.
#[derive(Debug, Clone)]
pub struct DispatchItem {
    pub handler_id: u64,
    pub event: String,
    pub actions: Actions,
    pub ctx: ActionContext,
}

struct PendingDebounce {
    deadline: Instant,
    ctx: ActionContext,
}

struct HandlerEntry {
    id: u64,
    def: EventHandlerDef,
    active: bool,
    throttle_last: Option<Instant>,
    debounce: Option<PendingDebounce>,
}

#[derive(Default)]
pub struct Router {
    handlers: HashMap<String, Vec<HandlerEntry>>,
    next_id: u64,
    event_cap: usize,
}

impl Router {
    pub fn new() -> Self {
        Self { handlers: HashMap::new(), next_id: 0, event_cap: DEFAULT_EVENT_CAP }
    }

    pub fn with_event_cap(event_cap: usize) -> Self {
        Self { handlers: HashMap::new(), next_id: 0, event_cap }
    }

    /// Register a handler at the end of its event's list.
    pub fn register(&mut self, def: EventHandlerDef) -> Result<u64, WeftError> {
        def.validate()?;
        let entries = self.handlers.entry(def.event.clone()).or_default();
        if entries.len() >= self.event_cap {
            return Err(WeftError::validation(format!(
                "event '{}' exceeds the cap of {} handlers",
                def.event, self.event_cap
            )));
        }
        self.next_id += 1;
        let id = self.next_id;
        entries.push(HandlerEntry {
            id,
            def,
            active: true,
            throttle_last: None,
            debounce: None,
        });
        Ok(id)
    }

    /// Gate an emit. `eval_when` decides conditions (reporting evaluation
    /// failures is the caller's job; a failed condition gates the handler
    /// out). Returns the dispatches that survived, in registration order.
    pub fn gate<F>(
        &mut self,
        event: &str,
        ctx: &ActionContext,
        now: Instant,
        mut eval_when: F,
    ) -> Vec<DispatchItem>
    where
        F: FnMut(&Condition, &ActionContext) -> bool,
    {
        let Some(entries) = self.handlers.get_mut(event) else { return Vec::new() };
        let mut items = Vec::new();

        for entry in entries.iter_mut() {
            if !entry.active {
                continue;
            }
            if let Some(when) = &entry.def.when {
                if !eval_when(when, ctx) {
                    continue;
                }
            }
            // Deactivate before running so re-entrant emits cannot re-fire
            if entry.def.once {
                entry.active = false;
            }

            if let Some(window) = entry.def.throttle.as_deref() {
                let window = parse_duration_or(window, Duration::ZERO);
                if let Some(last) = entry.throttle_last {
                    if last + window > now {
                        continue;
                    }
                }
                entry.throttle_last = Some(now);
            } else if let Some(window) = entry.def.debounce.as_deref() {
                let window = parse_duration_or(window, Duration::ZERO);
                // Cancel any pending execution, reschedule with this
                // emit's context
                entry.debounce =
                    Some(PendingDebounce { deadline: now + window, ctx: ctx.fork() });
                continue;
            }

            items.push(DispatchItem {
                handler_id: entry.id,
                event: event.to_string(),
                actions: entry.def.actions.clone(),
                ctx: ctx.fork(),
            });
        }
        items
    }

    /// Debounced executions whose quiet period elapsed.
    pub fn fired_debounces(&mut self, now: Instant) -> Vec<DispatchItem> {
        let mut items = Vec::new();
        for (event, entries) in &mut self.handlers {
            for entry in entries.iter_mut() {
                let due = entry.debounce.as_ref().is_some_and(|p| p.deadline <= now);
                if due {
                    if let Some(pending) = entry.debounce.take() {
                        items.push(DispatchItem {
                            handler_id: entry.id,
                            event: event.clone(),
                            actions: entry.def.actions.clone(),
                            ctx: pending.ctx,
                        });
                    }
                }
            }
        }
        items
    }

    /// Earliest pending debounce deadline.
    pub fn next_debounce_deadline(&self) -> Option<Instant> {
        self.handlers
            .values()
            .flatten()
            .filter_map(|e| e.debounce.as_ref().map(|p| p.deadline))
            .min()
    }

    /// Drop all handlers and cancel all pending debounces.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.get(event).map(Vec::len).unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn active_count(&self, event: &str) -> usize {
        self.handlers
            .get(event)
            .map(|entries| entries.iter().filter(|e| e.active).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
