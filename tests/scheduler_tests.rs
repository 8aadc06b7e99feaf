#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{DateTime, Duration, TimeZone, Utc, Weekday};
use konkur_countdown_bot::exams::{ExamCatalog, ExamEvent};
use konkur_countdown_bot::services::countdown::{CountdownEngine, CountdownState};
use konkur_countdown_bot::services::scheduler::{Recurrence, ReminderScheduler, TimeOfDay};
use konkur_countdown_bot::utils::jalali::JalaliDateTime;
use std::collections::BTreeSet;
use std::sync::Arc;

fn math_catalog() -> Arc<ExamCatalog> {
    let target = JalaliDateTime::from_parts(1405, 4, 11, 8, 0).unwrap();
    let event = ExamEvent::new("Math", "Math", chrono_tz::Asia::Tehran, [target]).unwrap();
    Arc::new(ExamCatalog::new(vec![event]).unwrap())
}

/// A local Tehran reading as an absolute instant
fn tehran(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    chrono_tz::Asia::Tehran
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn scheduler_with_math_rule() -> ReminderScheduler {
    let scheduler = ReminderScheduler::new(chrono_tz::Asia::Tehran, math_catalog());
    scheduler
        .upsert(
            42,
            vec!["Math".to_string()],
            TimeOfDay::new(8, 0).unwrap(),
            Recurrence::EveryDay,
        )
        .unwrap();
    scheduler
}

#[test]
fn test_countdown_one_day_before_math() {
    let catalog = math_catalog();
    let engine = CountdownEngine::new(catalog.clone());
    // 1405/04/10 08:00 in Tehran
    let now = JalaliDateTime::from_parts(1405, 4, 10, 8, 0)
        .unwrap()
        .to_utc(chrono_tz::Asia::Tehran)
        .unwrap();

    let results = engine.compute_by_key("Math", now).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].event_name, "Math");
    assert_eq!(
        results[0].state,
        CountdownState::Pending {
            days: 1,
            hours: 0,
            minutes: 0
        }
    );
}

#[test]
fn test_countdown_truncates_within_bounds() {
    let catalog = math_catalog();
    let event = catalog.find("Math").unwrap();
    let target = event.targets()[0].instant;

    for offset in [1_i64, 59, 60, 61, 3599, 86_399, 86_401, 1_000_000] {
        let now = target - Duration::seconds(offset);
        let results = CountdownEngine::compute(event, now);
        let CountdownState::Pending {
            days,
            hours,
            minutes,
        } = results[0].state
        else {
            panic!("expected pending at offset {offset}");
        };
        let shown = days * 86_400 + hours * 3600 + minutes * 60;
        assert!(shown <= offset && offset < shown + 60, "offset {offset}");
    }
}

#[test]
fn test_fires_at_eight_every_day() {
    let scheduler = scheduler_with_math_rule();

    // Any weekday of the week
    for day in 1..=7 {
        let firings = scheduler.tick(tehran(2026, 6, day, 8, 0));
        assert_eq!(firings.len(), 1, "day {day}");
        assert_eq!(firings[0].subscriber_id, 42);
        assert_eq!(firings[0].exams, BTreeSet::from(["Math".to_string()]));
    }
}

#[test]
fn test_no_firing_at_eight_oh_one() {
    let scheduler = scheduler_with_math_rule();
    assert!(scheduler.tick(tehran(2026, 6, 1, 8, 1)).is_empty());
    assert!(scheduler.tick(tehran(2026, 6, 1, 7, 59)).is_empty());
}

#[test]
fn test_disable_then_upsert_fires_again() {
    let scheduler = scheduler_with_math_rule();
    let eight = tehran(2026, 6, 1, 8, 0);

    let disabled = scheduler.disable(42).unwrap();
    assert!(!disabled.enabled);
    assert!(scheduler.tick(eight).is_empty());
    // Disabling again changes nothing
    assert_eq!(scheduler.disable(42), Some(disabled));

    scheduler
        .upsert(
            42,
            vec!["Math".to_string()],
            TimeOfDay::new(8, 0).unwrap(),
            Recurrence::EveryDay,
        )
        .unwrap();
    assert_eq!(scheduler.tick(eight).len(), 1);
}

#[test]
fn test_enable_keeps_rule() {
    let scheduler = scheduler_with_math_rule();
    scheduler.disable(42);
    let rule = scheduler.enable(42).unwrap();
    assert!(rule.enabled);
    assert_eq!(rule.time_of_day, TimeOfDay::new(8, 0).unwrap());
    assert_eq!(scheduler.tick(tehran(2026, 6, 2, 8, 0)).len(), 1);
}

#[test]
fn test_second_upsert_replaces() {
    let scheduler = scheduler_with_math_rule();
    scheduler
        .upsert(
            42,
            vec!["Math".to_string()],
            TimeOfDay::new(21, 30).unwrap(),
            Recurrence::EveryDay,
        )
        .unwrap();

    assert_eq!(scheduler.len(), 1);
    assert!(scheduler.tick(tehran(2026, 6, 1, 8, 0)).is_empty());
    assert_eq!(scheduler.tick(tehran(2026, 6, 1, 21, 30)).len(), 1);
}

#[test]
fn test_delete_is_idempotent() {
    let scheduler = scheduler_with_math_rule();
    assert!(scheduler.delete(42).is_some());
    assert!(scheduler.delete(42).is_none());
    assert!(scheduler.is_empty());
    assert!(scheduler.tick(tehran(2026, 6, 1, 8, 0)).is_empty());
}

#[test]
fn test_weekday_rule_skips_other_days() {
    let scheduler = ReminderScheduler::new(chrono_tz::Asia::Tehran, math_catalog());
    scheduler
        .upsert(
            7,
            vec!["Math".to_string()],
            TimeOfDay::new(8, 0).unwrap(),
            Recurrence::weekdays([Weekday::Sat]).unwrap(),
        )
        .unwrap();

    // 2026-06-06 is a Saturday
    assert_eq!(scheduler.tick(tehran(2026, 6, 6, 8, 0)).len(), 1);
    assert!(scheduler.tick(tehran(2026, 6, 7, 8, 0)).is_empty());
}

#[test]
fn test_tick_reads_time_in_scheduler_zone() {
    let scheduler = ReminderScheduler::new(chrono_tz::Etc::UTC, math_catalog());
    scheduler
        .upsert(
            1,
            vec!["Math".to_string()],
            TimeOfDay::new(8, 0).unwrap(),
            Recurrence::EveryDay,
        )
        .unwrap();

    // 08:00 in Tehran is 04:30 UTC
    assert!(scheduler.tick(tehran(2026, 6, 1, 8, 0)).is_empty());
    let utc_eight = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();
    assert_eq!(scheduler.tick(utc_eight).len(), 1);
}
