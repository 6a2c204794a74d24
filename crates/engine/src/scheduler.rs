// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron jobs and one-shot timers
//!
//! Poll-based core: the runtime's pump asks what fired and when to wake
//! next, so tests drive time through the clock. Firing is best-effort at
//! or after the scheduled instant; skipped intervals are not backfilled
//! (the next instant is always computed from now). A job whose actions
//! overrun its interval starts a second concurrent execution — authors
//! needing exclusion set a guard variable.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use weft_core::{Value, WeftError};
use weft_spec::{Actions, JobDef, SchedulerDef};

/// Something due: a cron job or a named one-shot timer.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledFire {
    Job { name: String, actions: Actions },
    Timer { id: String, event: String, data: Value },
}

#[derive(Debug)]
struct CronJob {
    name: String,
    schedule: cron::Schedule,
    tz: Tz,
    actions: Actions,
    next: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct OneShotTimer {
    deadline_ms: u64,
    event: String,
    data: Value,
}

#[derive(Default, Debug)]
pub struct Scheduler {
    jobs: Vec<CronJob>,
    timers: HashMap<String, OneShotTimer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the spec's `scheduler` section; disabled jobs are
    /// skipped entirely.
    pub fn from_spec(def: &SchedulerDef, now_utc: DateTime<Utc>) -> Result<Self, WeftError> {
        let mut scheduler = Self::new();
        for job in def.jobs.iter().filter(|j| j.enabled) {
            scheduler.add_job(job, now_utc)?;
        }
        Ok(scheduler)
    }

    fn add_job(&mut self, job: &JobDef, now_utc: DateTime<Utc>) -> Result<(), WeftError> {
        let schedule = cron::Schedule::from_str(&job.cron).map_err(|e| {
            WeftError::validation(format!("job '{}': bad cron expression: {e}", job.name))
        })?;
        let tz = match &job.timezone {
            Some(zone) => Tz::from_str(zone).map_err(|_| {
                WeftError::validation(format!("job '{}': unknown timezone '{zone}'", job.name))
            })?,
            None => Tz::UTC,
        };
        let next = next_after(&schedule, tz, now_utc);
        self.jobs.push(CronJob {
            name: job.name.clone(),
            schedule,
            tz,
            actions: job.actions.clone(),
            next,
        });
        Ok(())
    }

    /// Register a named one-shot timer; an existing timer with the same id
    /// is replaced.
    pub fn set_timer(
        &mut self,
        id: impl Into<String>,
        duration: Duration,
        event: impl Into<String>,
        data: Value,
        now_ms: u64,
    ) {
        self.timers.insert(
            id.into(),
            OneShotTimer {
                deadline_ms: now_ms + duration.as_millis() as u64,
                event: event.into(),
                data,
            },
        );
    }

    pub fn cancel_timer(&mut self, id: &str) -> bool {
        self.timers.remove(id).is_some()
    }

    /// Everything due at `now`. Cron jobs advance to their next instant
    /// computed from now; due timers are consumed.
    pub fn fired(&mut self, now_utc: DateTime<Utc>, now_ms: u64) -> Vec<ScheduledFire> {
        let mut fires = Vec::new();

        for job in &mut self.jobs {
            if let Some(next) = job.next {
                if next <= now_utc {
                    fires.push(ScheduledFire::Job {
                        name: job.name.clone(),
                        actions: job.actions.clone(),
                    });
                    job.next = next_after(&job.schedule, job.tz, now_utc);
                }
            }
        }

        let due: Vec<String> = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline_ms <= now_ms)
            .map(|(id, _)| id.clone())
            .collect();
        for id in due {
            if let Some(timer) = self.timers.remove(&id) {
                fires.push(ScheduledFire::Timer { id, event: timer.event, data: timer.data });
            }
        }

        fires
    }

    /// Milliseconds until the next due instant, if anything is pending.
    pub fn next_deadline_ms(&self, now_utc: DateTime<Utc>, now_ms: u64) -> Option<u64> {
        let job_wait = self
            .jobs
            .iter()
            .filter_map(|j| j.next)
            .map(|next| (next - now_utc).num_milliseconds().max(0) as u64)
            .min();
        let timer_wait = self
            .timers
            .values()
            .map(|t| t.deadline_ms.saturating_sub(now_ms))
            .min();
        match (job_wait, timer_wait) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.timers.is_empty() || self.jobs.iter().any(|j| j.next.is_some())
    }

    /// Pending timers `(id, deadline_ms)` — the persistence hook an
    /// adapter can snapshot and replay after a restart.
    pub fn pending_timers(&self) -> Vec<(String, u64)> {
        self.timers.iter().map(|(id, t)| (id.clone(), t.deadline_ms)).collect()
    }
}

/// Next firing instant strictly after `now`, evaluated in the job's zone.
fn next_after(schedule: &cron::Schedule, tz: Tz, now_utc: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let now_local = now_utc.with_timezone(&tz);
    schedule.after(&now_local).next().map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
