//! Calendar-date helpers.
//!
//! All dates cross the engine boundary as `YYYY-MM-DD` strings and are held
//! internally as `NaiveDate`. There is no time-of-day anywhere.

use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date, rejecting anything else
///
/// chrono alone accepts unpadded fields and signed years, so the shape is
/// checked before parsing.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if !is_canonical(trimmed) {
        return Err(Error::InvalidDate(format!(
            "{:?}: expected YYYY-MM-DD",
            trimmed
        )));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|e| Error::InvalidDate(format!("{:?}: {}", trimmed, e)))
}

/// Exactly ten bytes: four digits, dash, two digits, dash, two digits
fn is_canonical(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Format a date in canonical `YYYY-MM-DD` form
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// First day of the given month
pub fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidDate(format!("no such month: {}-{:02}", year, month)))
}

/// Number of days in the given month, leap years included
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = first_of_month(year, month)?;
    let (next_year, next_month) = next_month(year, month);
    let next_first = first_of_month(next_year, next_month)?;
    Ok((next_first - first).num_days() as u32)
}

/// The month before `(year, month)`, rolling January back into December
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// The month after `(year, month)`, rolling December into January
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// Whole days from `from` to `to` (negative when `to` is earlier)
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// `date` shifted by `days`, or `None` outside chrono's calendar range
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::try_days(days)?)
}

/// Sunday-based weekday index (0 = Sunday)
pub fn weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}
