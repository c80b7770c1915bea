//! Calendar helpers: inclusive date ranges, date keys from source
//! timestamps, Monday-to-Sunday week bounds and the race countdown.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Iterate every date in the range, in order. Empty when `start > end`.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start
            .iter_days()
            .take_while(move |date| *date <= end)
    }

    pub fn len_days(&self) -> i64 {
        if self.start > self.end {
            0
        } else {
            (self.end - self.start).num_days() + 1
        }
    }
}

/// Extract the calendar date from a source value that may be a bare date
/// (`2026-01-06`) or a full timestamp (`2026-01-06T18:45:00Z`).
///
/// Only the leading `YYYY-MM-DD` is significant: an activity logged at any
/// time of day counts for the date written in the source, with no timezone
/// conversion.
pub fn date_key(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let prefix = trimmed.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Monday-to-Sunday bounds of the calendar week containing `date`
pub fn calendar_week(date: NaiveDate) -> DateRange {
    let monday = date.week(Weekday::Mon).first_day();
    let sunday = monday
        .checked_add_days(Days::new(6))
        .unwrap_or(NaiveDate::MAX);
    DateRange::new(monday, sunday)
}

/// Whole days from `today` until `race_date`; negative once the race is past
pub fn days_until(race_date: NaiveDate, today: NaiveDate) -> i64 {
    (race_date - today).num_days()
}

/// Short English day name (Mon, Tue...)
pub fn day_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Day and month without padding, e.g. `6.1`
pub fn format_day_month(date: NaiveDate) -> String {
    format!("{}.{}", date.day(), date.month())
}

pub fn format_range(range: &DateRange) -> String {
    format!(
        "{} - {}",
        format_day_month(range.start),
        format_day_month(range.end)
    )
}
