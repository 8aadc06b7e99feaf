use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::utils::jalali::JalaliDateTime;

/// Jalali wall-clock reading of `dt` in `zone`, e.g. `1405/04/11 - 08:00`.
/// Falls back to the Gregorian reading outside the supported Jalali range.
pub fn format_datetime(dt: &DateTime<Utc>, zone: Tz) -> String {
    match JalaliDateTime::from_utc(*dt, zone) {
        Ok(jalali) => jalali.to_string(),
        Err(_) => dt.with_timezone(&zone).format("%Y-%m-%d - %H:%M").to_string(),
    }
}
