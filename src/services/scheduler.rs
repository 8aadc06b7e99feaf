//! Per-subscriber reminder rules and the per-minute due check.
//!
//! The scheduler never performs I/O. A periodic driver calls [`ReminderScheduler::tick`]
//! once a minute and delivers whatever it returns.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;

use crate::exams::ExamCatalog;

/// Opaque recipient id; the Telegram chat id
pub type SubscriberId = i64;

/// Rule validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    #[error("a reminder needs at least one exam")]
    EmptyExamSet,

    #[error("unknown exam: {0}")]
    UnknownExam(String),

    #[error("{hour:02}:{minute:02} is not a valid time of day")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("'{0}' is not a valid time of day, expected HH:MM")]
    MalformedTime(String),

    #[error("a weekday recurrence needs at least one day")]
    EmptyWeekdays,

    #[error("'{0}' is not a valid recurrence")]
    MalformedRecurrence(String),
}

/// When a reminder switched on without a time goes off
pub const DEFAULT_REMINDER_TIME: TimeOfDay = TimeOfDay { hour: 8, minute: 0 };

/// Wall-clock hour and minute in the scheduler's time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ReminderError> {
        if hour > 23 || minute > 59 {
            return Err(ReminderError::InvalidTime { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    fn of<T: Timelike>(time: &T) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ReminderError;

    /// Strict `HH:MM` parsing, as stored in the database
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ReminderError::MalformedTime(s.to_string());
        let (h, m) = s.split_once(':').ok_or_else(malformed)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(malformed());
        }
        let hour = h.parse().map_err(|_| malformed())?;
        let minute = m.parse().map_err(|_| malformed())?;
        Self::new(hour, minute)
    }
}

/// Which days a rule fires on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    EveryDay,
    /// Sorted Monday-first, no duplicates
    Weekdays(Vec<Weekday>),
}

impl Recurrence {
    pub fn weekdays(days: impl IntoIterator<Item = Weekday>) -> Result<Self, ReminderError> {
        let mut days: Vec<Weekday> = days.into_iter().collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days.dedup();
        match days.len() {
            0 => Err(ReminderError::EmptyWeekdays),
            7 => Ok(Recurrence::EveryDay),
            _ => Ok(Recurrence::Weekdays(days)),
        }
    }

    pub fn includes(&self, day: Weekday) -> bool {
        match self {
            Recurrence::EveryDay => true,
            Recurrence::Weekdays(days) => days.contains(&day),
        }
    }
}

fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::EveryDay => f.write_str("daily"),
            Recurrence::Weekdays(days) => {
                let codes: Vec<&str> = days.iter().map(|d| weekday_code(*d)).collect();
                f.write_str(&codes.join(","))
            }
        }
    }
}

impl FromStr for Recurrence {
    type Err = ReminderError;

    /// Parses the stored form: `daily` or comma-separated three-letter codes
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "daily" {
            return Ok(Recurrence::EveryDay);
        }
        let days = s
            .split(',')
            .map(|code| {
                code.parse::<Weekday>()
                    .map_err(|_| ReminderError::MalformedRecurrence(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::weekdays(days)
    }
}

/// A subscriber's reminder: which exams, when, and whether it is active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRule {
    pub subscriber_id: SubscriberId,
    pub exams: BTreeSet<String>,
    pub time_of_day: TimeOfDay,
    pub recurrence: Recurrence,
    pub enabled: bool,
}

/// Everything the scheduler holds for one subscriber, used to undo a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberSnapshot {
    pub rule: Option<ReminderRule>,
    /// Minute bucket the rule last fired in
    pub last_fired: Option<i64>,
}

/// A rule that is due in the current minute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueFiring {
    pub subscriber_id: SubscriberId,
    pub exams: BTreeSet<String>,
}

/// Owns every subscriber's rule and decides which fire on each tick
#[derive(Debug)]
pub struct ReminderScheduler {
    zone: Tz,
    catalog: Arc<ExamCatalog>,
    rules: RwLock<HashMap<SubscriberId, ReminderRule>>,
    /// Minute bucket each subscriber last fired in
    fired: Mutex<HashMap<SubscriberId, i64>>,
}

impl ReminderScheduler {
    pub fn new(zone: Tz, catalog: Arc<ExamCatalog>) -> Self {
        Self {
            zone,
            catalog,
            rules: RwLock::new(HashMap::new()),
            fired: Mutex::new(HashMap::new()),
        }
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Replaces the subscriber's rule with an enabled one.
    pub fn upsert(
        &self,
        subscriber_id: SubscriberId,
        exams: impl IntoIterator<Item = String>,
        time_of_day: TimeOfDay,
        recurrence: Recurrence,
    ) -> Result<ReminderRule, ReminderError> {
        let exams: BTreeSet<String> = exams.into_iter().collect();
        if exams.is_empty() {
            return Err(ReminderError::EmptyExamSet);
        }
        if let Some(unknown) = exams.iter().find(|key| !self.catalog.contains(key)) {
            return Err(ReminderError::UnknownExam(unknown.clone()));
        }
        if let Recurrence::Weekdays(days) = &recurrence {
            if days.is_empty() {
                return Err(ReminderError::EmptyWeekdays);
            }
        }

        let rule = ReminderRule {
            subscriber_id,
            exams,
            time_of_day,
            recurrence,
            enabled: true,
        };

        self.write_rules().insert(subscriber_id, rule.clone());
        self.forget_firing(subscriber_id);
        Ok(rule)
    }

    /// Stops the rule from firing while keeping its exams and time.
    /// Returns the rule as it now stands, if there is one.
    pub fn disable(&self, subscriber_id: SubscriberId) -> Option<ReminderRule> {
        self.set_enabled(subscriber_id, false)
    }

    /// Re-activates a retained rule without changing it
    pub fn enable(&self, subscriber_id: SubscriberId) -> Option<ReminderRule> {
        self.set_enabled(subscriber_id, true)
    }

    fn set_enabled(&self, subscriber_id: SubscriberId, enabled: bool) -> Option<ReminderRule> {
        let mut rules = self.write_rules();
        let rule = rules.get_mut(&subscriber_id)?;
        rule.enabled = enabled;
        Some(rule.clone())
    }

    /// Removes the rule. Deleting a missing rule is a no-op returning `None`.
    pub fn delete(&self, subscriber_id: SubscriberId) -> Option<ReminderRule> {
        let removed = self.write_rules().remove(&subscriber_id);
        self.forget_firing(subscriber_id);
        removed
    }

    /// Captures the subscriber's rule and firing record before a change
    pub fn snapshot(&self, subscriber_id: SubscriberId) -> SubscriberSnapshot {
        SubscriberSnapshot {
            rule: self.get(subscriber_id),
            last_fired: self.fired().get(&subscriber_id).copied(),
        }
    }

    /// Puts a subscriber back to a previously observed state, including the
    /// minute it last fired in so a rollback cannot fire twice in one minute.
    pub fn reinstate(&self, subscriber_id: SubscriberId, snapshot: SubscriberSnapshot) {
        let mut rules = self.write_rules();
        match snapshot.rule {
            Some(rule) => {
                rules.insert(subscriber_id, rule);
            }
            None => {
                rules.remove(&subscriber_id);
            }
        }
        let mut fired = self.fired();
        match snapshot.last_fired {
            Some(bucket) => {
                fired.insert(subscriber_id, bucket);
            }
            None => {
                fired.remove(&subscriber_id);
            }
        }
    }

    /// Replaces every rule, e.g. with what was persisted before a restart.
    /// Exam keys are not checked here; stale keys are skipped when rendering.
    pub fn load(&self, loaded: impl IntoIterator<Item = ReminderRule>) -> usize {
        let mut rules = self.write_rules();
        rules.clear();
        for rule in loaded {
            rules.insert(rule.subscriber_id, rule);
        }
        rules.len()
    }

    pub fn get(&self, subscriber_id: SubscriberId) -> Option<ReminderRule> {
        self.read_rules().get(&subscriber_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read_rules().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn enabled_count(&self) -> usize {
        self.read_rules().values().filter(|r| r.enabled).count()
    }

    /// Rules due at `now`, read in the scheduler's time zone.
    ///
    /// Each rule fires at most once per minute: a second tick inside the
    /// same minute returns nothing for rules that already fired.
    pub fn tick(&self, now: DateTime<Utc>) -> Vec<DueFiring> {
        let local = now.with_timezone(&self.zone);
        let time_of_day = TimeOfDay::of(&local);
        let weekday = local.weekday();
        let bucket = now.timestamp().div_euclid(60);

        let due: Vec<DueFiring> = self
            .read_rules()
            .values()
            .filter(|rule| {
                rule.enabled
                    && rule.time_of_day == time_of_day
                    && rule.recurrence.includes(weekday)
            })
            .map(|rule| DueFiring {
                subscriber_id: rule.subscriber_id,
                exams: rule.exams.clone(),
            })
            .collect();

        let mut fired = self.fired();
        due.into_iter()
            .filter(|firing| fired.insert(firing.subscriber_id, bucket) != Some(bucket))
            .collect()
    }

    fn forget_firing(&self, subscriber_id: SubscriberId) {
        self.fired().remove(&subscriber_id);
    }

    fn fired(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriberId, i64>> {
        self.fired.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_rules(&self) -> std::sync::RwLockReadGuard<'_, HashMap<SubscriberId, ReminderRule>> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_rules(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<SubscriberId, ReminderRule>> {
        self.rules.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scheduler() -> ReminderScheduler {
        let catalog = Arc::new(ExamCatalog::konkur_1405().unwrap());
        ReminderScheduler::new(chrono_tz::Asia::Tehran, catalog)
    }

    fn tehran(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        chrono_tz::Asia::Tehran
            .with_ymd_and_hms(2026, 5, d, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_time_of_day_parsing() {
        assert_eq!("08:00".parse::<TimeOfDay>().unwrap(), TimeOfDay::new(8, 0).unwrap());
        assert_eq!("7:30".parse::<TimeOfDay>().unwrap(), TimeOfDay::new(7, 30).unwrap());
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("12:60".parse::<TimeOfDay>().is_err());
        assert!("1200".parse::<TimeOfDay>().is_err());
        assert!("12:5".parse::<TimeOfDay>().is_err());
        assert_eq!(TimeOfDay::new(7, 5).unwrap().to_string(), "07:05");
    }

    #[test]
    fn test_recurrence_round_trip_form() {
        let rec = Recurrence::weekdays([Weekday::Sat, Weekday::Mon, Weekday::Sat]).unwrap();
        assert_eq!(rec.to_string(), "mon,sat");
        assert_eq!("mon,sat".parse::<Recurrence>().unwrap(), rec);
        assert_eq!("daily".parse::<Recurrence>().unwrap(), Recurrence::EveryDay);
        assert!("someday".parse::<Recurrence>().is_err());
    }

    #[test]
    fn test_all_seven_days_is_every_day() {
        let all = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ];
        assert_eq!(Recurrence::weekdays(all).unwrap(), Recurrence::EveryDay);
        assert_eq!(
            Recurrence::weekdays(Vec::new()).unwrap_err(),
            ReminderError::EmptyWeekdays
        );
    }

    #[test]
    fn test_upsert_validates_exams() {
        let s = scheduler();
        let at = TimeOfDay::new(8, 0).unwrap();
        assert_eq!(
            s.upsert(1, Vec::new(), at, Recurrence::EveryDay).unwrap_err(),
            ReminderError::EmptyExamSet
        );
        assert_eq!(
            s.upsert(1, vec!["chemistry".to_string()], at, Recurrence::EveryDay)
                .unwrap_err(),
            ReminderError::UnknownExam("chemistry".to_string())
        );
        assert!(s.is_empty());
    }

    #[test]
    fn test_second_tick_in_same_minute_does_not_refire() {
        let s = scheduler();
        s.upsert(
            42,
            vec!["math".to_string()],
            TimeOfDay::new(8, 0).unwrap(),
            Recurrence::EveryDay,
        )
        .unwrap();

        let now = tehran(4, 8, 0);
        assert_eq!(s.tick(now).len(), 1);
        assert!(s.tick(now + chrono::Duration::seconds(30)).is_empty());
        // Next day fires again
        assert_eq!(s.tick(now + chrono::Duration::days(1)).len(), 1);
    }

    #[test]
    fn test_weekday_recurrence() {
        let s = scheduler();
        // 2026-05-04 is a Monday
        s.upsert(
            7,
            vec!["exp".to_string()],
            TimeOfDay::new(20, 0).unwrap(),
            Recurrence::weekdays([Weekday::Mon]).unwrap(),
        )
        .unwrap();

        assert_eq!(s.tick(tehran(4, 20, 0)).len(), 1);
        assert!(s.tick(tehran(5, 20, 0)).is_empty());
    }

    #[test]
    fn test_reinstate_restores_previous_state() {
        let s = scheduler();
        let at = TimeOfDay::new(8, 0).unwrap();
        let old = s
            .upsert(3, vec!["art".to_string()], at, Recurrence::EveryDay)
            .unwrap();
        let eight = Utc.with_ymd_and_hms(2026, 6, 1, 4, 30, 0).unwrap();
        assert_eq!(s.tick(eight).len(), 1);

        let before = s.snapshot(3);
        assert_eq!(before.rule, Some(old.clone()));
        assert!(before.last_fired.is_some());

        s.upsert(3, vec!["lang".to_string()], at, Recurrence::EveryDay)
            .unwrap();
        s.reinstate(3, before);
        assert_eq!(s.get(3), Some(old));
        assert!(s.tick(eight + chrono::Duration::seconds(20)).is_empty());

        s.reinstate(
            3,
            SubscriberSnapshot {
                rule: None,
                last_fired: None,
            },
        );
        assert!(s.get(3).is_none());
    }

    #[test]
    fn test_load_replaces_everything() {
        let s = scheduler();
        let at = TimeOfDay::new(8, 0).unwrap();
        s.upsert(1, vec!["art".to_string()], at, Recurrence::EveryDay)
            .unwrap();

        let restored = ReminderRule {
            subscriber_id: 2,
            exams: ["retired-exam".to_string()].into_iter().collect(),
            time_of_day: at,
            recurrence: Recurrence::EveryDay,
            enabled: false,
        };
        assert_eq!(s.load(vec![restored.clone()]), 1);
        assert!(s.get(1).is_none());
        assert_eq!(s.get(2), Some(restored));
        assert_eq!(s.enabled_count(), 0);
    }
}
