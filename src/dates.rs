//! Date ranges and reference-time resolution
//!
//! All dates exchanged with the rest of the crate use one canonical string
//! format ([`DATE_FORMAT`]). Callers normalize anything else before it reaches
//! this module.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::index::KeyIndex;

/// Canonical date format shared by every component
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// End-date sentinel meaning "today in the reference timezone"
pub const NOW_SENTINEL: &str = "NOW";

/// Default reference timezone for resolving [`NOW_SENTINEL`]
pub const DEFAULT_REFERENCE_TIMEZONE: &str = "America/New_York";

/// Parse a canonical date string
pub fn parse_date(value: &str) -> Result<NaiveDate, GridError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| GridError::DateParseError(format!("{}: {}", value, e)))
}

/// Format a date in the canonical format
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range; `start` must not be after `end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, GridError> {
        if start > end {
            return Err(GridError::InvalidRange {
                start: format_date(start),
                end: format_date(end),
            });
        }
        Ok(Self { start, end })
    }

    /// Create a range from canonical date strings
    pub fn from_strs(start: &str, end: &str) -> Result<Self, GridError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days, both endpoints included
    pub fn len(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    /// Never true; a valid range holds at least one day
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Every day in the range, in order. Each call starts a fresh iterator.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.len())
    }

    /// Every day in the range as canonical strings
    pub fn date_strings(&self) -> impl Iterator<Item = String> {
        self.iter().map(format_date)
    }

    /// Column index over the range's date strings
    pub fn to_index(&self) -> Result<KeyIndex, GridError> {
        KeyIndex::build(self.date_strings())
    }
}

/// Report end date as supplied by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndDate {
    /// Resolve to today in the reference timezone
    Now,
    Date(NaiveDate),
}

impl EndDate {
    /// Parse either the `NOW` sentinel or a canonical date string
    pub fn parse(value: &str) -> Result<Self, GridError> {
        if value == NOW_SENTINEL {
            Ok(EndDate::Now)
        } else {
            parse_date(value).map(EndDate::Date)
        }
    }

    /// Resolve to a concrete date using the clock at `instant`
    pub fn resolve(&self, clock: &ReferenceClock, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            EndDate::Now => clock.today_at(instant),
            EndDate::Date(date) => *date,
        }
    }
}

/// Resolves instants to local calendar dates in a fixed reference timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceClock {
    tz: Tz,
}

impl ReferenceClock {
    /// Create a clock for an IANA timezone name
    pub fn new(timezone: &str) -> Result<Self, GridError> {
        Ok(Self {
            tz: parse_timezone(timezone)?,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Local date of `instant` in the reference timezone
    pub fn today_at(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Local date right now
    pub fn today(&self) -> NaiveDate {
        self.today_at(Utc::now())
    }
}

impl Default for ReferenceClock {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
        }
    }
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> Result<Tz, GridError> {
    name.parse::<Tz>()
        .map_err(|_| GridError::InvalidTimezone(name.to_string()))
}

/// Human-readable date, e.g. "Jan 2, 2024"
pub fn friendly_date(value: &str) -> Result<String, GridError> {
    Ok(parse_date(value)?.format("%b %-d, %Y").to_string())
}

/// Human-readable local time of a millisecond timestamp, e.g. "3:04 PM"
pub fn friendly_time(timestamp_millis: i64, tz: Tz) -> Result<String, GridError> {
    let instant = DateTime::<Utc>::from_timestamp_millis(timestamp_millis).ok_or_else(|| {
        GridError::DateParseError(format!("timestamp out of range: {}", timestamp_millis))
    })?;
    Ok(instant.with_timezone(&tz).format("%-I:%M %p").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_range_is_inclusive() {
        let range = DateRange::from_strs("2024-01-01", "2024-01-03").unwrap();
        let dates: Vec<String> = range.date_strings().collect();

        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(range.len(), 3);
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::from_strs("2024-02-29", "2024-02-29").unwrap();
        assert_eq!(range.date_strings().collect::<Vec<_>>(), vec!["2024-02-29"]);
    }

    #[test]
    fn test_range_crosses_month_and_leap_day() {
        let range = DateRange::from_strs("2024-02-27", "2024-03-02").unwrap();
        let dates: Vec<NaiveDate> = range.iter().collect();

        assert_eq!(dates.len(), 5);
        assert_eq!(format_date(dates[2]), "2024-02-29");
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(dates.first().copied(), Some(range.start()));
        assert_eq!(dates.last().copied(), Some(range.end()));
    }

    #[test]
    fn test_range_is_restartable() {
        let range = DateRange::from_strs("2024-01-01", "2024-01-10").unwrap();
        let first: Vec<String> = range.date_strings().collect();
        let second: Vec<String> = range.date_strings().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reversed_range_rejected() {
        let result = DateRange::from_strs("2024-01-03", "2024-01-01");
        assert!(matches!(result, Err(GridError::InvalidRange { .. })));
    }

    #[test]
    fn test_malformed_date_rejected() {
        assert!(matches!(
            parse_date("01/02/2024"),
            Err(GridError::DateParseError(_))
        ));
    }

    #[test]
    fn test_now_resolves_in_reference_timezone() {
        let clock = ReferenceClock::new("America/New_York").unwrap();
        // 03:00 UTC on Jan 2 is still Jan 1 in New York
        let instant = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();

        let end = EndDate::parse("NOW").unwrap();
        assert_eq!(format_date(end.resolve(&clock, instant)), "2024-01-01");

        let fixed = EndDate::parse("2024-03-05").unwrap();
        assert_eq!(format_date(fixed.resolve(&clock, instant)), "2024-03-05");
    }

    #[test]
    fn test_invalid_timezone() {
        assert!(matches!(
            ReferenceClock::new("Mars/Olympus_Mons"),
            Err(GridError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_friendly_formatting() {
        assert_eq!(friendly_date("2024-01-02").unwrap(), "Jan 2, 2024");

        // 2024-01-01T20:04:00Z
        let millis = Utc
            .with_ymd_and_hms(2024, 1, 1, 20, 4, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(
            friendly_time(millis, chrono_tz::America::New_York).unwrap(),
            "3:04 PM"
        );
    }
}
