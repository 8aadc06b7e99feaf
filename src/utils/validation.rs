use anyhow::{anyhow, Result};
use chrono::Weekday;

use crate::exams::ExamCatalog;
use crate::services::scheduler::{Recurrence, TimeOfDay};

const MAX_SUBJECT_LEN: usize = 50;
const MAX_STUDY_HOURS: f64 = 24.0;

/// Maps Persian (U+06F0..) and Arabic-Indic (U+0660..) digits to ASCII,
/// plus the Arabic decimal separator to '.'
pub fn normalize_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{066B}' => '.',
            _ => c,
        })
        .collect()
}

/// Lenient 24-hour time input: `20:00`, `7:30`, `۰۷:۳۰` or a bare hour `8`
pub fn parse_time_of_day(input: &str) -> Result<TimeOfDay> {
    let normalized = normalize_digits(input.trim());
    if normalized.is_empty() {
        return Err(anyhow!("Time cannot be empty"));
    }

    if !normalized.contains(':') {
        let hour: u32 = normalized
            .parse()
            .map_err(|_| anyhow!("Time must look like HH:MM, e.g. 20:00"))?;
        return Ok(TimeOfDay::new(hour, 0)?);
    }

    normalized
        .parse::<TimeOfDay>()
        .map_err(|e| anyhow!("Time must look like HH:MM, e.g. 20:00 ({e})"))
}

fn parse_weekday(token: &str) -> Result<Weekday> {
    token
        .parse::<Weekday>()
        .map_err(|_| anyhow!("Unknown day '{}'", token))
}

/// `daily`, `weekdays` (Sat-Wed), `weekend` (Thu-Fri) or a list like `sat,mon`
pub fn parse_recurrence(input: &str) -> Result<Recurrence> {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "" | "daily" | "everyday" | "every day" => Ok(Recurrence::EveryDay),
        "weekdays" => Ok(Recurrence::weekdays([
            Weekday::Sat,
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
        ])?),
        "weekend" => Ok(Recurrence::weekdays([Weekday::Thu, Weekday::Fri])?),
        list => {
            let days = list
                .split([',', ' '])
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(parse_weekday)
                .collect::<Result<Vec<_>>>()?;
            Ok(Recurrence::weekdays(days)?)
        }
    }
}

/// Resolves a comma-separated list of exam keys or names; `all` selects
/// every exam in the catalog
pub fn parse_exam_keys(input: &str, catalog: &ExamCatalog) -> Result<Vec<String>> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Pick at least one exam"));
    }
    if input.eq_ignore_ascii_case("all") {
        return Ok(catalog.keys().into_iter().map(str::to_string).collect());
    }

    let mut keys = Vec::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let event = catalog.resolve(token).ok_or_else(|| {
            anyhow!(
                "Unknown exam '{}'. Valid exams: {}",
                token,
                catalog.keys().join(", ")
            )
        })?;
        if !keys.iter().any(|k| k == event.key()) {
            keys.push(event.key().to_string());
        }
    }

    if keys.is_empty() {
        return Err(anyhow!("Pick at least one exam"));
    }
    Ok(keys)
}

/// Parsed arguments of `/remind <time> [exams] [days]`
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderRequest {
    pub time_of_day: TimeOfDay,
    /// `None` means "use the subscriber's preferred exam"
    pub exams: Option<Vec<String>>,
    pub recurrence: Recurrence,
}

pub fn parse_reminder_request(args: &str, catalog: &ExamCatalog) -> Result<ReminderRequest> {
    let mut tokens = args.split_whitespace();
    let time = tokens
        .next()
        .ok_or_else(|| anyhow!("Tell me when to remind you, e.g. /remind 20:00 math"))?;
    let time_of_day = parse_time_of_day(time)?;

    // The exam list is optional, so `/remind 20:00 weekdays` is a recurrence
    let rest: Vec<&str> = tokens.collect();
    let (exams, days) = match rest.split_first() {
        Some((first, days)) => match parse_exam_keys(first, catalog) {
            Ok(keys) => (Some(keys), days.join(" ")),
            Err(e) if parse_recurrence(&rest.join(" ")).is_err() => return Err(e),
            Err(_) => (None, rest.join(" ")),
        },
        None => (None, String::new()),
    };
    let recurrence = parse_recurrence(&days)?;

    Ok(ReminderRequest {
        time_of_day,
        exams,
        recurrence,
    })
}

/// A study session as typed by the user
#[derive(Debug, Clone, PartialEq)]
pub struct StudyInput {
    pub subject: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub hours: f64,
}

/// `subject, start, end, hours`, separated by ',' or the Persian comma '،'
pub fn parse_study_entry(input: &str) -> Result<StudyInput> {
    let parts: Vec<&str> = input.split([',', '،']).map(str::trim).collect();
    if parts.len() != 4 {
        return Err(anyhow!(
            "Expected 4 parts: subject, start (HH:MM), end (HH:MM), hours"
        ));
    }

    let subject = parts[0];
    if subject.is_empty() {
        return Err(anyhow!("Subject cannot be empty"));
    }
    if subject.chars().count() > MAX_SUBJECT_LEN {
        return Err(anyhow!(
            "Subject cannot be longer than {} characters",
            MAX_SUBJECT_LEN
        ));
    }
    if subject.contains('\n') || subject.contains('\r') {
        return Err(anyhow!("Subject cannot contain line breaks"));
    }

    let start = parse_time_of_day(parts[1])?;
    let end = parse_time_of_day(parts[2])?;

    let hours: f64 = normalize_digits(parts[3])
        .parse()
        .map_err(|_| anyhow!("Hours must be a number, e.g. 1.5"))?;
    if !hours.is_finite() || hours <= 0.0 || hours > MAX_STUDY_HOURS {
        return Err(anyhow!("Hours must be between 0 and 24"));
    }

    Ok(StudyInput {
        subject: subject.to_string(),
        start,
        end,
        hours,
    })
}

/// 1-based position in a listed set of `len` items
pub fn parse_entry_number(input: &str, len: usize) -> Result<usize> {
    let n: usize = normalize_digits(input.trim())
        .parse()
        .map_err(|_| anyhow!("Give the entry number shown by /progress"))?;
    if n == 0 || n > len {
        return Err(anyhow!("There is no entry number {}", n));
    }
    Ok(n)
}

pub fn validate_telegram_chat_id(chat_id: i64) -> Result<()> {
    // Telegram chat IDs should be non-zero
    if chat_id == 0 {
        return Err(anyhow!("Chat ID cannot be zero"));
    }

    // Supergroup ids sit around -100xxxxxxxxxx; anything far below is bogus
    if chat_id < -2000000000000 {
        return Err(anyhow!("Chat ID out of valid range"));
    }

    Ok(())
}
