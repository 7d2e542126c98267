// Date keys and times of day
//
// Appointments and tasks are filed under a canonical `YYYY-MM-DD` day key and
// carry zero-padded 24-hour `HH:MM` times. Everything that reaches the store
// goes through the parsers here first.

use crate::error::{Result, StoreError};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical day key (`YYYY-MM-DD`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Parse a calendar date or an ISO-8601 date-time into a day key
    ///
    /// Date-times with an offset are converted to UTC before the day is taken.
    /// Date-times without an offset are taken as written.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            return Ok(Self(date));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self(dt.with_timezone(&Utc).date_naive()));
        }

        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Ok(Self(dt.date()));
            }
        }

        Err(StoreError::Validation(format!(
            "Invalid date '{}' (expected YYYY-MM-DD or an ISO-8601 date-time)",
            input
        )))
    }

    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// The seven day keys of this date's week, Monday first
    pub fn week(&self) -> Vec<DateKey> {
        let monday = self.0 - Duration::days(self.0.weekday().num_days_from_monday() as i64);
        (0..7).map(|offset| Self(monday + Duration::days(offset))).collect()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl From<DateTime<Utc>> for DateKey {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.date_naive())
    }
}

/// Time of day at minute precision, rendered as `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Parse `H:MM`, `HH:MM`, `H:MM:SS` or `HH:MM:SS`; seconds are dropped
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || StoreError::Validation(format!("Invalid time '{}' (expected HH:MM)", input));

        let parts: Vec<&str> = input.trim().split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(invalid());
        }

        let mut fields = [0u32; 3];
        for (slot, part) in fields.iter_mut().zip(&parts) {
            if part.is_empty() || part.len() > 2 || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse().map_err(|_| invalid())?;
        }

        let [hour, minute, second] = fields;
        if second > 59 {
            return Err(invalid());
        }
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self).ok_or_else(invalid)
    }

    /// Combine with a day for display
    pub fn on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.0)
    }

    /// Combine with today's local date; the date part is never persisted
    pub fn on_today(&self) -> NaiveDateTime {
        self.on(Local::now().date_naive())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0.hour(), self.0.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_plain_date() {
        let key = DateKey::parse("2024-05-01").unwrap();
        assert_eq!(key.to_string(), "2024-05-01");
    }

    #[test]
    fn test_date_key_pads_components() {
        let key = DateKey::parse("2024-5-1").unwrap();
        assert_eq!(key.to_string(), "2024-05-01");
    }

    #[test]
    fn test_date_key_iso_datetime_utc() {
        let key = DateKey::parse("2024-05-01T23:30:00.000Z").unwrap();
        assert_eq!(key.to_string(), "2024-05-01");
    }

    #[test]
    fn test_date_key_offset_converted_to_utc() {
        // 00:30 at +02:00 is still the previous day in UTC
        let key = DateKey::parse("2024-05-02T00:30:00+02:00").unwrap();
        assert_eq!(key.to_string(), "2024-05-01");
    }

    #[test]
    fn test_date_key_naive_datetime() {
        let key = DateKey::parse("2024-05-01T09:15").unwrap();
        assert_eq!(key.to_string(), "2024-05-01");
    }

    #[test]
    fn test_date_key_rejects_garbage() {
        assert!(matches!(DateKey::parse("tomorrow"), Err(StoreError::Validation(_))));
        assert!(DateKey::parse("2024-13-01").is_err());
        assert!(DateKey::parse("").is_err());
    }

    #[test]
    fn test_date_key_from_chrono_values() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(DateKey::from(date).to_string(), "2024-05-01");

        let dt = date.and_hms_opt(12, 0, 0).unwrap().and_utc();
        assert_eq!(DateKey::from(dt).to_string(), "2024-05-01");
    }

    #[test]
    fn test_week_starts_monday() {
        // 2024-05-01 is a Wednesday
        let week = DateKey::parse("2024-05-01").unwrap().week();
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].to_string(), "2024-04-29");
        assert_eq!(week[6].to_string(), "2024-05-05");
    }

    #[test]
    fn test_time_zero_pads() {
        assert_eq!(TimeOfDay::parse("9:05").unwrap().to_string(), "09:05");
        assert_eq!(TimeOfDay::parse("09:05").unwrap().to_string(), "09:05");
    }

    #[test]
    fn test_time_drops_seconds() {
        assert_eq!(TimeOfDay::parse("9:05:00").unwrap().to_string(), "09:05");
        assert_eq!(TimeOfDay::parse("23:59:59").unwrap().to_string(), "23:59");
    }

    #[test]
    fn test_time_rejects_out_of_range() {
        assert!(TimeOfDay::parse("24:00").is_err());
        assert!(TimeOfDay::parse("12:60").is_err());
        assert!(TimeOfDay::parse("12:00:60").is_err());
        assert!(TimeOfDay::parse("noon").is_err());
        assert!(TimeOfDay::parse("12").is_err());
        assert!(TimeOfDay::parse("1:2:3:4").is_err());
        assert!(TimeOfDay::parse("-1:00").is_err());
    }

    #[test]
    fn test_time_on_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let dt = TimeOfDay::parse("14:30").unwrap().on(date);
        assert_eq!(dt.to_string(), "2024-05-01 14:30:00");
    }

    #[test]
    fn test_time_on_today_uses_local_date() {
        let dt = TimeOfDay::parse("08:00").unwrap().on_today();
        assert_eq!(dt.date(), Local::now().date_naive());
        assert_eq!(dt.time(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    }
}
