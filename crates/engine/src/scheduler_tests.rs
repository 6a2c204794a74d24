// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn spec(doc: serde_json::Value) -> SchedulerDef {
    serde_json::from_value(doc).unwrap()
}

#[test]
fn cron_job_fires_at_or_after_its_instant() {
    let now = utc("2026-03-01T10:00:30Z");
    // Every minute at :00 seconds
    let mut s = Scheduler::from_spec(
        &spec(serde_json::json!({ "jobs": [ { "name": "tick", "cron": "0 * * * * *" } ] })),
        now,
    )
    .unwrap();

    assert!(s.fired(now, 0).is_empty());
    assert_eq!(s.next_deadline_ms(now, 0), Some(30_000));

    let later = utc("2026-03-01T10:01:00Z");
    let fires = s.fired(later, 0);
    assert_eq!(fires.len(), 1);
    assert!(matches!(&fires[0], ScheduledFire::Job { name, .. } if name == "tick"));

    // Not again until the next minute
    assert!(s.fired(later, 0).is_empty());
}

#[test]
fn skipped_intervals_are_not_backfilled() {
    let now = utc("2026-03-01T10:00:30Z");
    let mut s = Scheduler::from_spec(
        &spec(serde_json::json!({ "jobs": [ { "name": "tick", "cron": "0 * * * * *" } ] })),
        now,
    )
    .unwrap();

    // Clock jumps five minutes: exactly one fire, not five
    let jumped = utc("2026-03-01T10:05:30Z");
    assert_eq!(s.fired(jumped, 0).len(), 1);
    assert!(s.fired(jumped, 0).is_empty());
}

#[test]
fn disabled_jobs_never_fire() {
    let now = utc("2026-03-01T10:00:00Z");
    let s = Scheduler::from_spec(
        &spec(serde_json::json!({
            "jobs": [ { "name": "off", "cron": "* * * * * *", "enabled": false } ],
        })),
        now,
    )
    .unwrap();
    assert!(!s.has_pending());
}

#[test]
fn timezone_shifts_the_firing_wall_clock() {
    // 04:00 Berlin is 03:00 UTC in winter
    let now = utc("2026-01-10T00:00:00Z");
    let s = Scheduler::from_spec(
        &spec(serde_json::json!({
            "jobs": [ { "name": "purge", "cron": "0 0 4 * * *", "timezone": "Europe/Berlin" } ],
        })),
        now,
    )
    .unwrap();
    assert_eq!(s.next_deadline_ms(now, 0), Some(3 * 3600 * 1000));
}

#[yare::parameterized(
    bad_cron = { serde_json::json!({ "jobs": [ { "name": "x", "cron": "not cron" } ] }) },
    bad_zone = { serde_json::json!({ "jobs": [ { "name": "x", "cron": "* * * * * *", "timezone": "Mars/Olympus" } ] }) },
)]
fn bad_specs_fail_validation(doc: serde_json::Value) {
    let err = Scheduler::from_spec(&spec(doc), utc("2026-01-01T00:00:00Z")).unwrap_err();
    assert!(matches!(err, WeftError::Validation(_)));
}

#[test]
fn one_shot_timer_lifecycle() {
    let mut s = Scheduler::new();
    s.set_timer("remind", Duration::from_secs(10), "reminder", Value::String("tea".into()), 1_000);
    assert!(s.has_pending());
    assert_eq!(s.next_deadline_ms(utc("2026-01-01T00:00:00Z"), 1_000), Some(10_000));

    assert!(s.fired(utc("2026-01-01T00:00:00Z"), 5_000).is_empty());

    let fires = s.fired(utc("2026-01-01T00:00:00Z"), 11_000);
    assert_eq!(fires.len(), 1);
    assert_eq!(
        fires[0],
        ScheduledFire::Timer {
            id: "remind".to_string(),
            event: "reminder".to_string(),
            data: Value::String("tea".into()),
        }
    );
    // Consumed on fire
    assert!(!s.has_pending());
}

#[test]
fn cancel_timer_removes_it() {
    let mut s = Scheduler::new();
    s.set_timer("t", Duration::from_secs(1), "e", Value::Null, 0);
    assert!(s.cancel_timer("t"));
    assert!(!s.cancel_timer("t"));
    assert!(s.fired(utc("2026-01-01T00:00:00Z"), 10_000).is_empty());
}

#[test]
fn setting_a_timer_twice_replaces_it() {
    let mut s = Scheduler::new();
    s.set_timer("t", Duration::from_secs(1), "first", Value::Null, 0);
    s.set_timer("t", Duration::from_secs(5), "second", Value::Null, 0);
    let fires = s.fired(utc("2026-01-01T00:00:00Z"), 10_000);
    assert_eq!(fires.len(), 1);
    assert!(matches!(&fires[0], ScheduledFire::Timer { event, .. } if event == "second"));
}

#[test]
fn pending_timers_snapshot_for_persistence() {
    let mut s = Scheduler::new();
    s.set_timer("a", Duration::from_secs(1), "e", Value::Null, 1_000);
    let pending = s.pending_timers();
    assert_eq!(pending, vec![("a".to_string(), 2_000)]);
}
