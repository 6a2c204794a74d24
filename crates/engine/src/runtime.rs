// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime assembly
//!
//! Builds every component from a validated spec — registry, state
//! manager, router, scheduler, pipes, metrics, error handler, locale —
//! and wires the data flow: external triggers enter `emit`, the router
//! gates handlers, the executor runs their action lists. The pump loop
//! drives debounces, scheduler fires, and pipe events through the clock,
//! so tests with a fake clock call `pump()` directly. The spec is
//! immutable and hot-swapped as a unit.

use crate::actions;
use crate::context::ActionContext;
use crate::errors::ErrorHandler;
use crate::locale::LocaleManager;
use crate::platform::PlatformClient;
use crate::registry::ActionRegistry;
use crate::router::Router;
use crate::scheduler::{ScheduledFire, Scheduler};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use weft_core::{
    Clock, ErrorCategory, MetricsCollector, Severity, Value, WeftError,
};
use weft_expr::Evaluator;
use weft_pipes::{PipeEvent, PipeManager};
use weft_spec::{resolve_command_actions, BotSpec};
use weft_storage::{StateManager, StorageAdapter};

/// Runtime tunables.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub default_locale: String,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub max_call_depth: usize,
    pub max_loop_iterations: u64,
    pub event_cap: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            cache_capacity: 10_000,
            cache_ttl: Duration::from_secs(60),
            max_call_depth: 64,
            max_loop_iterations: 1_000,
            event_cap: crate::router::DEFAULT_EVENT_CAP,
        }
    }
}

pub struct Runtime<C: Clock> {
    config: RuntimeConfig,
    clock: C,
    spec: RwLock<Arc<BotSpec>>,
    registry: ActionRegistry<C>,
    storage: Arc<dyn StorageAdapter>,
    state: RwLock<Arc<StateManager<C>>>,
    platform: Arc<dyn PlatformClient>,
    pipes: RwLock<Arc<PipeManager>>,
    pipe_events: tokio::sync::Mutex<tokio::sync::mpsc::Receiver<PipeEvent>>,
    metrics: MetricsCollector,
    errors: ErrorHandler,
    evaluator: Evaluator,
    locale: RwLock<Arc<LocaleManager>>,
    router: Mutex<Router>,
    scheduler: Mutex<Scheduler>,
    shutdown: CancellationToken,
}

impl<C: Clock> Runtime<C> {
    pub fn new(
        spec: BotSpec,
        storage: Arc<dyn StorageAdapter>,
        platform: Arc<dyn PlatformClient>,
        clock: C,
        config: RuntimeConfig,
    ) -> Result<Self, WeftError> {
        let spec = Arc::new(spec);

        let state = StateManager::new(Arc::clone(&storage), spec.state.clone(), clock.clone())
            .with_cache(config.cache_capacity, config.cache_ttl);

        let mut router = Router::with_event_cap(config.event_cap);
        for handler in &spec.events {
            router.register(handler.clone())?;
        }

        let scheduler = Scheduler::from_spec(&spec.scheduler, clock.now_utc())?;

        let (pipes, pipe_events) = PipeManager::build(&spec.pipes);

        let metrics = MetricsCollector::new();
        for (name, decl) in &spec.metrics {
            metrics.declare_counter(name, &decl.help);
        }

        let errors = ErrorHandler::new(spec.errors.clone().unwrap_or_default());
        let locale = LocaleManager::new(spec.locale.clone(), config.default_locale.clone());

        let now_clock = clock.clone();
        let evaluator = Evaluator::new().with_now(move || now_clock.epoch_ms());

        Ok(Self {
            registry: actions::builtin_registry(),
            storage,
            state: RwLock::new(Arc::new(state)),
            platform,
            pipes: RwLock::new(Arc::new(pipes)),
            pipe_events: tokio::sync::Mutex::new(pipe_events),
            metrics,
            errors,
            evaluator,
            locale: RwLock::new(Arc::new(locale)),
            router: Mutex::new(router),
            scheduler: Mutex::new(scheduler),
            shutdown: CancellationToken::new(),
            spec: RwLock::new(spec),
            clock,
            config,
        })
    }

    // --- component access (handlers and control flow go through these) ---

    pub fn spec(&self) -> Arc<BotSpec> {
        Arc::clone(&self.spec.read())
    }

    pub fn state(&self) -> Arc<StateManager<C>> {
        Arc::clone(&self.state.read())
    }

    pub fn platform(&self) -> &Arc<dyn PlatformClient> {
        &self.platform
    }

    pub fn pipes(&self) -> Arc<PipeManager> {
        Arc::clone(&self.pipes.read())
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn errors(&self) -> &ErrorHandler {
        &self.errors
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn locale(&self) -> Arc<LocaleManager> {
        Arc::clone(&self.locale.read())
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub(crate) fn registry(&self) -> &ActionRegistry<C> {
        &self.registry
    }

    /// Register a custom action handler (startup-time extension point).
    pub fn register_action(&mut self, name: impl Into<String>, handler: crate::registry::HandlerFn<C>) {
        self.registry.register(name, handler);
    }

    // --- lifecycle ---

    /// Prepare storage and open every pipe.
    pub async fn start(&self) -> Result<(), WeftError> {
        self.state().ensure_tables().await?;
        self.pipes().connect_all().await;
        Ok(())
    }

    /// Graceful shutdown: cancel the pump, close pipes (cancelling
    /// reconnects and heartbeats), clear caches and router state.
    pub async fn close(&self) {
        self.shutdown.cancel();
        self.pipes().shutdown().await;
        self.router.lock().clear();
        self.state().close();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Replace the spec as a unit: handlers, jobs, pipes, locale, and the
    /// state schema are rebuilt; in-flight dispatches finish on the old
    /// structures.
    pub async fn hot_swap(&self, new_spec: BotSpec) -> Result<(), WeftError> {
        let new_spec = Arc::new(new_spec);

        // Build everything that can fail before touching live state
        let mut router = Router::with_event_cap(self.config.event_cap);
        for handler in &new_spec.events {
            router.register(handler.clone())?;
        }
        let scheduler = Scheduler::from_spec(&new_spec.scheduler, self.clock.now_utc())?;
        let state =
            StateManager::new(Arc::clone(&self.storage), new_spec.state.clone(), self.clock.clone())
                .with_cache(self.config.cache_capacity, self.config.cache_ttl);
        let (pipes, pipe_events) = PipeManager::build(&new_spec.pipes);
        let locale =
            LocaleManager::new(new_spec.locale.clone(), self.config.default_locale.clone());

        let old_pipes = {
            let mut slot = self.pipes.write();
            std::mem::replace(&mut *slot, Arc::new(pipes))
        };
        old_pipes.shutdown().await;
        *self.pipe_events.lock().await = pipe_events;

        self.state().close();
        *self.state.write() = Arc::new(state);
        *self.router.lock() = router;
        *self.scheduler.lock() = scheduler;
        *self.locale.write() = Arc::new(locale);
        *self.spec.write() = new_spec;

        self.state().ensure_tables().await?;
        self.pipes().connect_all().await;
        Ok(())
    }

    // --- dispatch ---

    /// Emit an event: gate handlers, run each surviving handler's action
    /// list. Handler failures are recorded and do not stop other handlers.
    pub fn emit<'a>(
        &'a self,
        event: &'a str,
        data: Value,
    ) -> futures_util::future::BoxFuture<'a, ()> {
        Box::pin(async move {
            self.metrics.increment("weft_events_total", 1.0, &[]);
            let ctx = trigger_context(event, data);
            let now = self.clock.now();
            let items = self.router.lock().gate(event, &ctx, now, |cond, ctx| {
                match self.eval_condition(cond, ctx) {
                    Ok(pass) => pass,
                    Err(err) => {
                        let _ = self.errors.handle(
                            err,
                            ErrorCategory::Expression,
                            Severity::Warn,
                            Some(event),
                        );
                        false
                    }
                }
            });
            for item in items {
                self.execute_dispatch(item).await;
            }
        })
    }

    pub(crate) async fn execute_dispatch(&self, mut item: crate::router::DispatchItem) {
        let result = self.run_sequence(&item.actions.0, &mut item.ctx, 0).await;
        if let Err(err) = result {
            let _ = self.errors.handle(
                err,
                ErrorCategory::Event,
                Severity::Error,
                Some(&item.event),
            );
        }
    }

    /// Dispatch a command invocation (`path` is `[command]`,
    /// `[command, sub]`, or `[command, group, sub]`). Errors are recorded
    /// through the error handler and surfaced to the caller so the
    /// adapter can render its failure message.
    pub async fn dispatch_command(
        &self,
        path: &[&str],
        args: Value,
        trigger: Value,
    ) -> Result<(), WeftError> {
        let spec = self.spec();
        let command_name = path.first().copied().unwrap_or_default();
        let command = spec
            .command(command_name)
            .ok_or_else(|| WeftError::validation(format!("unknown command '{command_name}'")))?;
        let actions = resolve_command_actions(&spec, path).ok_or_else(|| {
            WeftError::validation(format!("unknown command path '{}'", path.join(" ")))
        })?;

        let mut ctx = trigger_context("command", trigger);
        ctx.set("args", args);
        ctx.set("command", Value::String(command_name.to_string()));

        if let Some(level_name) = &command.access {
            self.check_access(&spec, level_name, &ctx)?;
        }

        self.metrics.increment("weft_commands_total", 1.0, &[("command", command_name)]);
        match self.run_sequence(&actions.0, &mut ctx, 0).await {
            Ok(_) => Ok(()),
            Err(err) => {
                let _ = self.errors.handle(
                    err.clone(),
                    ErrorCategory::Action,
                    Severity::Error,
                    Some(command_name),
                );
                Err(err)
            }
        }
    }

    /// Access rule: the invoking user must appear in the permission
    /// level's user list or carry one of its roles.
    fn check_access(
        &self,
        spec: &BotSpec,
        level_name: &str,
        ctx: &ActionContext,
    ) -> Result<(), WeftError> {
        let level = spec.permissions.get(level_name).ok_or_else(|| {
            WeftError::validation(format!("unknown permission level '{level_name}'"))
        })?;
        let user_id = ctx.scope().user_id.unwrap_or_default();
        if level.users.iter().any(|u| u == &user_id) {
            return Ok(());
        }
        let roles = ctx
            .get("member")
            .map(|m| m.get_member("roles"))
            .unwrap_or(Value::Null);
        if let Value::Array(roles) = roles {
            if roles
                .iter()
                .any(|r| level.roles.iter().any(|allowed| allowed == &r.to_display_string()))
            {
                return Ok(());
            }
        }
        Err(WeftError::validation(format!("access denied: requires '{level_name}'")))
    }

    // --- timers (C7 surface used by the timing actions) ---

    pub fn set_timer(&self, id: String, duration: Duration, event: String, data: Value) {
        self.scheduler.lock().set_timer(id, duration, event, data, self.clock.epoch_ms());
    }

    pub fn cancel_timer(&self, id: &str) -> bool {
        self.scheduler.lock().cancel_timer(id)
    }

    /// Pending one-shot timers (persistence hook for adapters).
    pub fn pending_timers(&self) -> Vec<(String, u64)> {
        self.scheduler.lock().pending_timers()
    }

    // --- pump ---

    /// One pump cycle: queued `runtime:error` events, due debounces, due
    /// scheduler fires. Tests drive this directly with a fake clock.
    pub async fn pump(&self) {
        for queued in self.errors.drain_events() {
            self.emit("runtime:error", queued.to_value()).await;
        }

        let due = self.router.lock().fired_debounces(self.clock.now());
        for item in due {
            self.execute_dispatch(item).await;
        }

        let fires = self.scheduler.lock().fired(self.clock.now_utc(), self.clock.epoch_ms());
        for fire in fires {
            match fire {
                ScheduledFire::Job { name, actions } => {
                    // Jobs carry their own actions; overlapping runs are
                    // not serialized
                    let mut ctx = ActionContext::new();
                    ctx.set("job", Value::String(name.clone()));
                    if let Err(err) = self.run_sequence(&actions.0, &mut ctx, 0).await {
                        let _ = self.errors.handle(
                            err,
                            ErrorCategory::Scheduler,
                            Severity::Error,
                            Some(&name),
                        );
                    }
                }
                ScheduledFire::Timer { id, event, data } => {
                    let payload = merge_timer_data(data, &id);
                    self.emit(&event, payload).await;
                }
            }
        }
    }

    /// Forward a pipe event into the router as `pipe:<name>:<event>`.
    pub async fn handle_pipe_event(&self, event: PipeEvent) {
        if event.event == "error" {
            let _ = self.errors.handle(
                WeftError::Transport(event.data.to_display_string()),
                ErrorCategory::Pipe,
                Severity::Warn,
                Some(&event.pipe),
            );
        }
        let name = format!("pipe:{}:{}", event.pipe, event.event);
        self.emit(&name, event.data).await;
    }

    /// Millis until the next due debounce or scheduler instant.
    pub fn next_deadline(&self) -> Option<Duration> {
        let now = self.clock.now();
        let debounce = self
            .router
            .lock()
            .next_debounce_deadline()
            .map(|deadline| deadline.saturating_duration_since(now));
        let scheduled = self
            .scheduler
            .lock()
            .next_deadline_ms(self.clock.now_utc(), self.clock.epoch_ms())
            .map(Duration::from_millis);
        match (debounce, scheduled) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Drive the runtime until shutdown: pipe events as they arrive,
    /// debounces and scheduler fires at their deadlines.
    pub async fn run(&self) {
        loop {
            if self.shutdown.is_cancelled() {
                return;
            }
            self.pump().await;

            let wait = self.next_deadline().unwrap_or(Duration::from_secs(60));
            let received = {
                let mut receiver = self.pipe_events.lock().await;
                tokio::select! {
                    _ = self.shutdown.cancelled() => return,
                    _ = tokio::time::sleep(wait) => None,
                    received = receiver.recv() => received,
                }
            };
            if let Some(event) = received {
                self.handle_pipe_event(event).await;
            }
        }
    }
}

/// Build the trigger context an emit sees: the payload's object fields as
/// top-level keys, plus the whole payload under `event`.
fn trigger_context(_event: &str, data: Value) -> ActionContext {
    let mut ctx = ActionContext::new();
    if let Value::Object(map) = &data {
        for (key, value) in map {
            ctx.set(key.clone(), value.clone());
        }
    }
    ctx.set("event", data);
    ctx
}

fn merge_timer_data(data: Value, timer_id: &str) -> Value {
    let mut map = match data {
        Value::Object(map) => map,
        Value::Null => indexmap::IndexMap::new(),
        other => {
            let mut map = indexmap::IndexMap::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    map.insert("timer".to_string(), Value::String(timer_id.to_string()));
    Value::Object(map)
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
