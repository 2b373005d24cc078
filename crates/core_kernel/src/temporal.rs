//! Calendar handling for spending windows
//!
//! Daily and monthly limits are evaluated against the account holder's
//! local calendar, not UTC. This module converts local calendar boundaries
//! (midnight, first of month) into UTC instants that can be compared with
//! stored transaction timestamps.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::error::CoreError;

/// Timezone wrapper for the jurisdiction whose calendar drives limits
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timezone::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Parses an IANA timezone name such as `Europe/Berlin`
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        Tz::from_str(name.trim())
            .map(Timezone)
            .map_err(|_| CoreError::Configuration(format!("Invalid timezone: {}", name)))
    }

    /// Returns the IANA name
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    /// Returns the local calendar date of a UTC instant
    pub fn local_date(&self, utc: DateTime<Utc>) -> NaiveDate {
        utc.with_timezone(&self.0).date_naive()
    }

    /// Gets the start of day (local midnight) in this timezone as UTC
    ///
    /// When midnight does not exist locally (a DST gap), the first
    /// existing instant after it is used.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve_local(date.and_time(chrono::NaiveTime::MIN))
    }

    /// Gets local midnight of the first day of the month containing `date`
    pub fn start_of_month(&self, date: NaiveDate) -> DateTime<Utc> {
        let first = date.with_day(1).unwrap_or(date);
        self.start_of_day(first)
    }

    fn resolve_local(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        let mut candidate = naive;
        // DST gaps are at most a few hours wide
        for _ in 0..4 {
            if let Some(local) = candidate.and_local_timezone(self.0).earliest() {
                return local.with_timezone(&Utc);
            }
            candidate += Duration::hours(1);
        }
        naive.and_utc()
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// Start instants of the calendar windows containing a given moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarWindows {
    /// Local midnight of the current day, as UTC
    pub day_start: DateTime<Utc>,
    /// Local midnight of the first day of the current month, as UTC
    pub month_start: DateTime<Utc>,
}

impl CalendarWindows {
    /// Computes the windows containing `now` in `timezone`
    pub fn containing(now: DateTime<Utc>, timezone: Timezone) -> Self {
        let today = timezone.local_date(now);
        Self {
            day_start: timezone.start_of_day(today),
            month_start: timezone.start_of_month(today),
        }
    }
}
