use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::exams::{ExamCatalog, ExamError, ExamEvent};
use crate::utils::jalali::JalaliDateTime;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_MINUTE: i64 = 60;

/// Remaining time until a single exam sitting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Pending { days: i64, hours: i64, minutes: i64 },
    Elapsed,
}

/// Countdown for one occurrence of an exam
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownResult {
    pub event_name: String,
    pub occurrence: JalaliDateTime,
    pub state: CountdownState,
}

impl CountdownResult {
    pub fn is_elapsed(&self) -> bool {
        self.state == CountdownState::Elapsed
    }

    pub fn render(&self) -> String {
        match self.state {
            CountdownState::Pending {
                days,
                hours,
                minutes,
            } => format!(
                "⏳ {} ({}): {} left",
                self.event_name,
                self.occurrence,
                format_remaining(days, hours, minutes)
            ),
            CountdownState::Elapsed => format!(
                "🌟 {} ({}) has arrived. Good luck!",
                self.event_name, self.occurrence
            ),
        }
    }
}

/// Breaks the time between `now` and `target` into whole days, hours and
/// minutes. Leftover seconds are dropped.
pub fn countdown_between(target: DateTime<Utc>, now: DateTime<Utc>) -> CountdownState {
    let total = (target - now).num_seconds();
    if total <= 0 {
        return CountdownState::Elapsed;
    }

    CountdownState::Pending {
        days: total / SECONDS_PER_DAY,
        hours: total % SECONDS_PER_DAY / SECONDS_PER_HOUR,
        minutes: total % SECONDS_PER_HOUR / SECONDS_PER_MINUTE,
    }
}

/// "3 days, 4 hours and 5 minutes"
pub fn format_remaining(days: i64, hours: i64, minutes: i64) -> String {
    fn unit(n: i64, name: &str) -> String {
        if n == 1 {
            format!("1 {name}")
        } else {
            format!("{n} {name}s")
        }
    }

    format!(
        "{}, {} and {}",
        unit(days, "day"),
        unit(hours, "hour"),
        unit(minutes, "minute")
    )
}

/// Joins several countdowns into one message, one line per occurrence
pub fn render(results: &[CountdownResult]) -> String {
    results
        .iter()
        .map(CountdownResult::render)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Computes countdowns against the exam catalog
#[derive(Debug, Clone)]
pub struct CountdownEngine {
    catalog: Arc<ExamCatalog>,
}

impl CountdownEngine {
    pub fn new(catalog: Arc<ExamCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<ExamCatalog> {
        &self.catalog
    }

    /// One result per sitting of `event`, in the order the sittings were
    /// defined. `now` is always supplied by the caller.
    pub fn compute(event: &ExamEvent, now: DateTime<Utc>) -> Vec<CountdownResult> {
        event
            .targets()
            .iter()
            .map(|target| CountdownResult {
                event_name: event.name().to_string(),
                occurrence: target.civil,
                state: countdown_between(target.instant, now),
            })
            .collect()
    }

    pub fn compute_by_key(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<CountdownResult>, ExamError> {
        let event = self.catalog.get(key)?;
        Ok(Self::compute(event, now))
    }

    pub fn render_by_key(&self, key: &str, now: DateTime<Utc>) -> Result<String, ExamError> {
        Ok(render(&self.compute_by_key(key, now)?))
    }
}
