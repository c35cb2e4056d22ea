//! Sync interval settings and next-run computation.
//!
//! A managed playlist is synced on a fixed interval (daily, weekly, monthly)
//! or on a custom weekly schedule (a set of weekdays plus a UTC time of day).
//! [`next_sync_at`] turns those settings into the timestamp the sync job
//! compares against when selecting due playlists.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Quantity pulled per source when the caller does not specify one.
pub const DEFAULT_QUANTITY_PER_SOURCE: i32 = 5;

/// Upper bound on tracks pulled per source per run.
pub const MAX_QUANTITY_PER_SOURCE: i32 = 100;

// ---------------------------------------------------------------------------
// Interval
// ---------------------------------------------------------------------------

/// How often a managed playlist is synced. Stored as its upper-case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncInterval {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl SyncInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for SyncInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncInterval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "CUSTOM" => Ok(Self::Custom),
            other => Err(CoreError::Validation(format!(
                "Unknown sync interval '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// What the sync job does with the tracks it selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncMode {
    Append,
    Replace,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Append => "APPEND",
            Self::Replace => "REPLACE",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "APPEND" => Ok(Self::Append),
            "REPLACE" => Ok(Self::Replace),
            other => Err(CoreError::Validation(format!("Unknown sync mode '{other}'"))),
        }
    }
}

/// Validate a quantity-per-source value against `1..=MAX_QUANTITY_PER_SOURCE`.
pub fn validate_quantity(quantity: i32) -> Result<i32, CoreError> {
    if (1..=MAX_QUANTITY_PER_SOURCE).contains(&quantity) {
        Ok(quantity)
    } else {
        Err(CoreError::Validation(format!(
            "Quantity per source must be between 1 and {MAX_QUANTITY_PER_SOURCE}, got {quantity}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Custom schedule
// ---------------------------------------------------------------------------

/// A custom weekly schedule: one or more weekdays at a fixed UTC time.
///
/// Always holds at least one weekday; construct through [`CustomSchedule::new`]
/// or [`CustomSchedule::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSchedule {
    days: Vec<Weekday>,
    time: NaiveTime,
}

impl CustomSchedule {
    /// Build a schedule, rejecting an empty day set. Duplicate days collapse.
    pub fn new(days: impl IntoIterator<Item = Weekday>, time: NaiveTime) -> Result<Self, CoreError> {
        let mut unique: Vec<Weekday> = Vec::new();
        for day in days {
            if !unique.contains(&day) {
                unique.push(day);
            }
        }
        if unique.is_empty() {
            return Err(CoreError::Validation(
                "A custom schedule needs at least one day".into(),
            ));
        }
        unique.sort_by_key(|d| d.num_days_from_monday());
        Ok(Self { days: unique, time })
    }

    /// Parse weekday names (`monday`, `Mon`, ...) and an `HH:MM` time.
    pub fn parse<S: AsRef<str>>(days: &[S], time: &str) -> Result<Self, CoreError> {
        let parsed_days = days
            .iter()
            .map(|d| parse_weekday(d.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let parsed_time = NaiveTime::parse_from_str(time.trim(), "%H:%M").map_err(|_| {
            CoreError::Validation(format!("Invalid schedule time '{time}', expected HH:MM"))
        })?;
        Self::new(parsed_days, parsed_time)
    }

    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    /// Lower-case weekday names, the form persisted in `custom_days`.
    pub fn day_names(&self) -> Vec<String> {
        self.days.iter().map(|d| weekday_name(*d).to_string()).collect()
    }

    /// The `HH:MM` form persisted in `custom_time`.
    pub fn time_string(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    /// The soonest matching weekday at the scheduled time strictly after `now`.
    pub fn next_after(&self, now: Timestamp) -> Timestamp {
        let today = now.date_naive();
        // Offsets 0..=7 cover every weekday, today included twice (before and after
        // the scheduled time), so a non-empty set always matches.
        for offset in 0..=7 {
            let date = today + Duration::days(offset);
            if !self.days.contains(&date.weekday()) {
                continue;
            }
            let candidate = date.and_time(self.time).and_utc();
            if candidate > now {
                return candidate;
            }
        }
        unreachable!("a non-empty weekday set always matches within seven days")
    }
}

fn parse_weekday(name: &str) -> Result<Weekday, CoreError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "monday" | "mon" => Ok(Weekday::Mon),
        "tuesday" | "tue" => Ok(Weekday::Tue),
        "wednesday" | "wed" => Ok(Weekday::Wed),
        "thursday" | "thu" => Ok(Weekday::Thu),
        "friday" | "fri" => Ok(Weekday::Fri),
        "saturday" | "sat" => Ok(Weekday::Sat),
        "sunday" | "sun" => Ok(Weekday::Sun),
        other => Err(CoreError::Validation(format!("Unknown weekday '{other}'"))),
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

// ---------------------------------------------------------------------------
// Next run
// ---------------------------------------------------------------------------

/// Compute when a playlist should next be synced.
///
/// Fixed intervals add one day, one week, or one calendar month to `now`
/// (month ends clamp, so Jan 31 + 1 month = Feb 28/29). `Custom` requires a
/// schedule.
pub fn next_sync_at(
    interval: SyncInterval,
    schedule: Option<&CustomSchedule>,
    now: Timestamp,
) -> Result<Timestamp, CoreError> {
    match interval {
        SyncInterval::Daily => Ok(now + Duration::days(1)),
        SyncInterval::Weekly => Ok(now + Duration::weeks(1)),
        SyncInterval::Monthly => now
            .checked_add_months(Months::new(1))
            .ok_or_else(|| CoreError::Internal("next monthly sync overflows".into())),
        SyncInterval::Custom => schedule.map(|s| s.next_after(now)).ok_or_else(|| {
            CoreError::Validation("CUSTOM interval requires days and a time".into())
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        chrono::Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    // 2024-01-02 is a Tuesday.

    #[test]
    fn daily_adds_one_day() {
        let now = at(2024, 1, 2, 15, 30);
        let next = next_sync_at(SyncInterval::Daily, None, now).unwrap();
        assert_eq!(next, at(2024, 1, 3, 15, 30));
    }

    #[test]
    fn weekly_adds_seven_days() {
        let now = at(2024, 1, 2, 15, 30);
        let next = next_sync_at(SyncInterval::Weekly, None, now).unwrap();
        assert_eq!(next, at(2024, 1, 9, 15, 30));
    }

    #[test]
    fn monthly_adds_one_calendar_month() {
        let now = at(2024, 1, 2, 15, 30);
        let next = next_sync_at(SyncInterval::Monthly, None, now).unwrap();
        assert_eq!(next, at(2024, 2, 2, 15, 30));
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        let now = at(2024, 1, 31, 8, 0);
        let next = next_sync_at(SyncInterval::Monthly, None, now).unwrap();
        assert_eq!(next, at(2024, 2, 29, 8, 0));
    }

    #[test]
    fn custom_monday_from_tuesday_is_next_monday() {
        let schedule = CustomSchedule::parse(&["monday"], "09:00").unwrap();
        let now = at(2024, 1, 2, 12, 0);
        let next = next_sync_at(SyncInterval::Custom, Some(&schedule), now).unwrap();
        assert_eq!(next, at(2024, 1, 8, 9, 0));
    }

    #[test]
    fn custom_same_day_before_time_is_today() {
        let schedule = CustomSchedule::parse(&["monday"], "09:00").unwrap();
        let now = at(2024, 1, 8, 8, 59);
        assert_eq!(schedule.next_after(now), at(2024, 1, 8, 9, 0));
    }

    #[test]
    fn custom_exactly_at_time_moves_to_next_week() {
        let schedule = CustomSchedule::parse(&["monday"], "09:00").unwrap();
        let now = at(2024, 1, 8, 9, 0);
        assert_eq!(schedule.next_after(now), at(2024, 1, 15, 9, 0));
    }

    #[test]
    fn custom_picks_soonest_of_several_days() {
        let schedule = CustomSchedule::parse(&["friday", "wed", "Sunday"], "18:30").unwrap();
        let now = at(2024, 1, 2, 12, 0);
        assert_eq!(schedule.next_after(now), at(2024, 1, 3, 18, 30));
    }

    #[test]
    fn custom_without_schedule_is_validation_error() {
        let result = next_sync_at(SyncInterval::Custom, None, at(2024, 1, 2, 0, 0));
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn empty_day_set_is_rejected() {
        let days: [&str; 0] = [];
        assert_matches!(
            CustomSchedule::parse(&days, "09:00"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn bad_weekday_and_time_are_rejected() {
        assert_matches!(
            CustomSchedule::parse(&["funday"], "09:00"),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            CustomSchedule::parse(&["monday"], "9am"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn duplicate_days_collapse_and_sort() {
        let schedule = CustomSchedule::parse(&["sun", "monday", "Mon"], "07:05").unwrap();
        assert_eq!(schedule.day_names(), vec!["monday", "sunday"]);
        assert_eq!(schedule.time_string(), "07:05");
    }

    #[test]
    fn interval_and_mode_parse_case_insensitively() {
        assert_eq!("weekly".parse::<SyncInterval>().unwrap(), SyncInterval::Weekly);
        assert_eq!(" CUSTOM ".parse::<SyncInterval>().unwrap(), SyncInterval::Custom);
        assert_eq!("replace".parse::<SyncMode>().unwrap(), SyncMode::Replace);
        assert!("hourly".parse::<SyncInterval>().is_err());
    }

    #[test]
    fn quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_QUANTITY_PER_SOURCE).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(MAX_QUANTITY_PER_SOURCE + 1).is_err());
    }
}
