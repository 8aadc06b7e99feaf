//! Persian (Jalali) calendar arithmetic.
//!
//! Conversion follows the 33-year break table used by the Iranian calendar
//! authorities. All functions are pure: no clock reads, no global state.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use thiserror::Error;

/// Failures converting civil Jalali instants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("Jalali year {0} is outside the supported range")]
    YearOutOfRange(i32),

    #[error("{year}/{month:02}/{day:02} is not a valid Jalali date")]
    InvalidDate { year: i32, month: u32, day: u32 },

    #[error("{hour:02}:{minute:02} is not a valid time of day")]
    InvalidTime { hour: u32, minute: u32 },

    #[error("{local} does not exist in time zone {zone}")]
    NonexistentLocalTime { local: String, zone: String },
}

// Years at which the leap cycle restarts.
const BREAKS: [i32; 20] = [
    -61, 9, 38, 199, 426, 686, 756, 818, 1111, 1181, 1210, 1635, 2060, 2097, 2192, 2262, 2324,
    2394, 2456, 3178,
];

struct YearInfo {
    /// Years since the last leap year; 0 means this year is leap.
    leap: i32,
    gregorian_year: i32,
    /// Day of March on which Farvardin 1 falls.
    march_day: u32,
}

fn year_info(jy: i32) -> Result<YearInfo, CalendarError> {
    if jy < BREAKS[0] || jy >= BREAKS[BREAKS.len() - 1] {
        return Err(CalendarError::YearOutOfRange(jy));
    }

    let gy = jy + 621;
    let mut leap_j = -14;
    let mut jp = BREAKS[0];
    let mut jump = 0;

    for &jm in &BREAKS[1..] {
        jump = jm - jp;
        if jy < jm {
            break;
        }
        leap_j += jump / 33 * 8 + (jump % 33) / 4;
        jp = jm;
    }

    let mut n = jy - jp;
    leap_j += n / 33 * 8 + (n % 33 + 3) / 4;
    if jump % 33 == 4 && jump - n == 4 {
        leap_j += 1;
    }

    let leap_g = gy / 4 - (gy / 100 + 1) * 3 / 4 - 150;
    let march_day = 20 + leap_j - leap_g;

    if jump - n < 6 {
        n = n - jump + (jump + 4) / 33 * 33;
    }
    let mut leap = ((n + 1) % 33 - 1) % 4;
    if leap == -1 {
        leap = 4;
    }

    Ok(YearInfo {
        leap,
        gregorian_year: gy,
        march_day: march_day as u32,
    })
}

/// Whether the given Jalali year has 30 days in Esfand
pub fn is_leap_year(year: i32) -> Result<bool, CalendarError> {
    Ok(year_info(year)?.leap == 0)
}

/// Number of days in a Jalali month
pub fn days_in_month(year: i32, month: u32) -> Result<u32, CalendarError> {
    let info = year_info(year)?;
    match month {
        1..=6 => Ok(31),
        7..=11 => Ok(30),
        12 if info.leap == 0 => Ok(30),
        12 => Ok(29),
        _ => Err(CalendarError::InvalidDate { year, month, day: 1 }),
    }
}

/// A validated date in the Jalali calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JalaliDate {
    year: i32,
    month: u32,
    day: u32,
}

impl JalaliDate {
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, CalendarError> {
        let invalid = CalendarError::InvalidDate { year, month, day };
        if !(1..=12).contains(&month) || day == 0 {
            return Err(invalid);
        }
        if day > days_in_month(year, month)? {
            return Err(invalid);
        }
        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Converts to the proleptic Gregorian date of the same day
    pub fn to_gregorian(&self) -> Result<NaiveDate, CalendarError> {
        let info = year_info(self.year)?;
        let nowruz = NaiveDate::from_ymd_opt(info.gregorian_year, 3, info.march_day)
            .ok_or(CalendarError::YearOutOfRange(self.year))?;
        let m = self.month as i64;
        let offset = (m - 1) * 31 - (m / 7) * (m - 7) + self.day as i64 - 1;
        Ok(nowruz + Duration::days(offset))
    }

    /// Converts a Gregorian date to its Jalali equivalent
    pub fn from_gregorian(date: NaiveDate) -> Result<Self, CalendarError> {
        let mut jy = date.year() - 621;
        let info = year_info(jy)?;
        let nowruz = NaiveDate::from_ymd_opt(date.year(), 3, info.march_day)
            .ok_or(CalendarError::YearOutOfRange(jy))?;
        let mut k = (date - nowruz).num_days();

        if k >= 0 {
            if k <= 185 {
                return Self::new(jy, 1 + (k / 31) as u32, (k % 31) as u32 + 1);
            }
            k -= 186;
        } else {
            jy -= 1;
            k += 179;
            if info.leap == 1 {
                k += 1;
            }
        }

        Self::new(jy, 7 + (k / 30) as u32, (k % 30) as u32 + 1)
    }
}

impl fmt::Display for JalaliDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

/// A Jalali date plus a wall-clock hour and minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JalaliDateTime {
    date: JalaliDate,
    hour: u32,
    minute: u32,
}

impl JalaliDateTime {
    pub fn new(date: JalaliDate, hour: u32, minute: u32) -> Result<Self, CalendarError> {
        if hour > 23 || minute > 59 {
            return Err(CalendarError::InvalidTime { hour, minute });
        }
        Ok(Self { date, hour, minute })
    }

    /// Shorthand for `JalaliDate::new` followed by `JalaliDateTime::new`
    pub fn from_parts(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    ) -> Result<Self, CalendarError> {
        Self::new(JalaliDate::new(year, month, day)?, hour, minute)
    }

    pub fn date(&self) -> JalaliDate {
        self.date
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn to_naive(&self) -> Result<NaiveDateTime, CalendarError> {
        self.date
            .to_gregorian()?
            .and_hms_opt(self.hour, self.minute, 0)
            .ok_or(CalendarError::InvalidTime {
                hour: self.hour,
                minute: self.minute,
            })
    }

    /// Resolves the civil instant in `zone` to an absolute UTC instant.
    ///
    /// Ambiguous local times (clocks turned back) resolve to the earlier
    /// instant; skipped local times are an error.
    pub fn to_utc(&self, zone: Tz) -> Result<DateTime<Utc>, CalendarError> {
        let naive = self.to_naive()?;
        zone.from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| CalendarError::NonexistentLocalTime {
                local: self.to_string(),
                zone: zone.name().to_string(),
            })
    }

    /// Civil Jalali wall-clock reading of an absolute instant in `zone`
    pub fn from_utc(instant: DateTime<Utc>, zone: Tz) -> Result<Self, CalendarError> {
        use chrono::Timelike;

        let local = instant.with_timezone(&zone);
        let date = JalaliDate::from_gregorian(local.date_naive())?;
        Self::new(date, local.hour(), local.minute())
    }
}

impl fmt::Display for JalaliDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {:02}:{:02}", self.date, self.hour, self.minute)
    }
}
