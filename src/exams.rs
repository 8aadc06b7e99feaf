//! Exam catalog - the fixed konkur dates the bot counts down to

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;
use thiserror::Error;

use crate::utils::jalali::{CalendarError, JalaliDateTime};

/// Lookup and construction failures for exam events
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExamError {
    #[error("unknown exam: {0}")]
    UnknownExam(String),

    #[error("exam '{0}' has no target dates")]
    NoTargets(String),

    #[error("exam key '{0}' is defined more than once")]
    DuplicateKey(String),

    #[error("exam name '{0}' is used more than once")]
    DuplicateName(String),

    #[error("exam keys and names cannot be blank")]
    BlankIdentifier,

    #[error("an exam catalog needs at least one exam")]
    EmptyCatalog,

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// One sitting of an exam: the civil instant and its absolute equivalent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamTarget {
    pub civil: JalaliDateTime,
    pub zone: Tz,
    pub instant: DateTime<Utc>,
}

/// A named exam with one or more sittings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamEvent {
    key: String,
    name: String,
    targets: Vec<ExamTarget>,
}

impl ExamEvent {
    /// Builds an event, resolving every civil target in `zone` up front so
    /// later countdowns cannot fail on calendar conversion.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        zone: Tz,
        targets: impl IntoIterator<Item = JalaliDateTime>,
    ) -> Result<Self, ExamError> {
        let key = key.into();
        let targets = targets
            .into_iter()
            .map(|civil| {
                Ok(ExamTarget {
                    civil,
                    zone,
                    instant: civil.to_utc(zone)?,
                })
            })
            .collect::<Result<Vec<_>, ExamError>>()?;

        if targets.is_empty() {
            return Err(ExamError::NoTargets(key));
        }

        Ok(Self {
            key,
            name: name.into(),
            targets,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn targets(&self) -> &[ExamTarget] {
        &self.targets
    }
}

/// Read-only table of exam events, in display order
#[derive(Debug, Clone)]
pub struct ExamCatalog {
    events: Vec<ExamEvent>,
}

impl ExamCatalog {
    /// Keys and names must be non-blank and unique ignoring case, since
    /// [`ExamCatalog::resolve`] matches on either.
    pub fn new(events: Vec<ExamEvent>) -> Result<Self, ExamError> {
        if events.is_empty() {
            return Err(ExamError::EmptyCatalog);
        }

        let mut keys = HashSet::new();
        let mut names = HashSet::new();
        for event in &events {
            if event.key.trim().is_empty() || event.name.trim().is_empty() {
                return Err(ExamError::BlankIdentifier);
            }
            if !keys.insert(event.key.to_lowercase()) {
                return Err(ExamError::DuplicateKey(event.key.clone()));
            }
            if !names.insert(event.name.to_lowercase()) {
                return Err(ExamError::DuplicateName(event.name.clone()));
            }
        }
        Ok(Self { events })
    }

    /// The 1405 (Tir) round of the national entrance exam
    pub fn konkur_1405() -> Result<Self, ExamError> {
        let zone = chrono_tz::Asia::Tehran;
        let at = JalaliDateTime::from_parts;

        Self::new(vec![
            ExamEvent::new("math", "Mathematics", zone, [at(1405, 4, 11, 8, 0)?])?,
            ExamEvent::new("human", "Humanities", zone, [at(1405, 4, 11, 8, 0)?])?,
            ExamEvent::new("art", "Art", zone, [at(1405, 4, 11, 14, 30)?])?,
            ExamEvent::new("exp", "Experimental Sciences", zone, [at(1405, 4, 12, 8, 0)?])?,
            ExamEvent::new("lang", "Foreign Languages", zone, [at(1405, 4, 12, 14, 30)?])?,
        ])
    }

    /// Exact key lookup
    pub fn find(&self, key: &str) -> Option<&ExamEvent> {
        self.events.iter().find(|e| e.key == key)
    }

    pub fn get(&self, key: &str) -> Result<&ExamEvent, ExamError> {
        self.find(key)
            .ok_or_else(|| ExamError::UnknownExam(key.to_string()))
    }

    /// Matches user input against keys and display names, ignoring case
    pub fn resolve(&self, query: &str) -> Option<&ExamEvent> {
        let query = query.trim();
        self.events.iter().find(|e| {
            e.key.eq_ignore_ascii_case(query) || e.name.eq_ignore_ascii_case(query)
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn events(&self) -> &[ExamEvent] {
        &self.events
    }

    pub fn keys(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.key.as_str()).collect()
    }
}
