//! Time parsing utilities for scheduler output.

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc, Weekday};
use std::time::Duration;
use thiserror::Error;

/// Number of years after which the Gregorian calendar repeats its
/// weekday/date alignment.
pub const WEEKDAY_CYCLE_YEARS: i32 = 28;

/// Output format of a recovered date-time.
const RECOVERED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted layouts of a year-less calendar stamp, with the year appended.
const CALENDAR_FORMATS: [&str; 2] = ["%b %d %H:%M:%S %Y", "%b %d %H:%M %Y"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DateError {
    #[error("Unrecognized weekday name: {0}")]
    InvalidWeekday(String),
    #[error("Could not parse calendar stamp: {0}")]
    InvalidStamp(String),
    #[error("No year within {years} years of {from} puts {stamp} on a {weekday}")]
    YearNotRecoverable {
        stamp: String,
        weekday: String,
        from: i32,
        years: i32,
    },
}

/// Parse a SLURM timestamp (YYYY-MM-DDTHH:MM:SS or placeholder values).
///
/// Returns None for empty strings or placeholder values like "N/A", "Unknown", "None".
pub fn parse_slurm_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() || s == "N/A" || s == "Unknown" || s == "None" {
        return None;
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .and_then(|dt| Utc.from_local_datetime(&dt).single())
}

fn parse_calendar_stamp(month_day_time: &str, year: i32) -> Option<NaiveDateTime> {
    let candidate = format!("{} {}", month_day_time, year);
    CALENDAR_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&candidate, fmt).ok())
}

/// Rebuild a full date-time from a calendar stamp that lacks its year.
///
/// See [`recover_date_time_from`]; the search starts at the current UTC year.
pub fn recover_date_time(
    weekday: &str,
    month_day_time: &str,
    year: Option<i32>,
) -> Result<String, DateError> {
    recover_date_time_from(weekday, month_day_time, year, Utc::now().year())
}

/// Rebuild a full date-time from a calendar stamp such as `"Jan 03 10:15:00"`.
///
/// With an explicit `year` the stamp is parsed in that year. Otherwise years
/// are tried backwards from `current_year` for one full weekday cycle, and
/// the first year in which the date falls on `weekday` wins. The result is
/// formatted as `YYYY-MM-DD HH:MM:SS`.
pub fn recover_date_time_from(
    weekday: &str,
    month_day_time: &str,
    year: Option<i32>,
    current_year: i32,
) -> Result<String, DateError> {
    let stamp = month_day_time.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(year) = year {
        return parse_calendar_stamp(&stamp, year)
            .map(|dt| dt.format(RECOVERED_FORMAT).to_string())
            .ok_or(DateError::InvalidStamp(stamp));
    }

    let wanted: Weekday = weekday
        .trim()
        .parse()
        .map_err(|_| DateError::InvalidWeekday(weekday.to_string()))?;

    // Feb 29 only parses in leap years, so a failed parse just skips the year.
    let found = (0..WEEKDAY_CYCLE_YEARS)
        .map(|back| current_year - back)
        .filter_map(|candidate| parse_calendar_stamp(&stamp, candidate))
        .find(|dt| dt.weekday() == wanted);

    found
        .map(|dt| dt.format(RECOVERED_FORMAT).to_string())
        .ok_or(DateError::YearNotRecoverable {
            stamp,
            weekday: weekday.to_string(),
            from: current_year,
            years: WEEKDAY_CYCLE_YEARS,
        })
}

/// Like [`recover_date_time`], with failures logged and reported as None.
pub fn recovered_date_time(
    weekday: &str,
    month_day_time: &str,
    year: Option<i32>,
) -> Option<String> {
    recover_date_time(weekday, month_day_time, year)
        .inspect_err(|e| tracing::warn!("Dropping date-time: {}", e))
        .ok()
}

/// Parse a duration in various formats.
///
/// Supports:
/// - D-HH:MM:SS (SLURM time limit with days)
/// - HH:MM:SS
/// - MM:SS
/// - Seconds as integer
///
/// Returns None for "UNLIMITED" or empty strings.
pub fn parse_duration(s: &str) -> Option<Duration> {
    if s.is_empty() || s == "UNLIMITED" || s == "-" {
        return None;
    }

    // Check for day separator (D-HH:MM:SS)
    let parts: Vec<&str> = s.split('-').collect();
    let (days, time_part) = if parts.len() == 2 {
        (parts[0].parse::<u64>().unwrap_or(0), parts[1])
    } else {
        (0, parts[0])
    };

    let time_parts: Vec<u64> = time_part
        .split(':')
        .filter_map(|p| p.parse().ok())
        .collect();

    let seconds = match time_parts.len() {
        3 => time_parts[0] * 3600 + time_parts[1] * 60 + time_parts[2],
        2 => time_parts[0] * 60 + time_parts[1],
        1 => time_parts[0],
        _ => return None,
    };

    Some(Duration::from_secs(days * 86400 + seconds))
}

/// Parse duration to seconds from various formats.
///
/// Like `parse_duration` but returns seconds as u64 instead of Duration.
pub fn parse_duration_secs(s: &str) -> Option<u64> {
    parse_duration(s).map(|d| d.as_secs())
}

/// Format seconds as human-readable duration (e.g., "1d 02:30:00", "01:30:00", "05:30").
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 24 {
        let days = hours / 24;
        let hours = hours % 24;
        format!("{}d {:02}:{:02}:{:02}", days, hours, mins, secs)
    } else if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slurm_timestamp() {
        let dt = parse_slurm_timestamp("2024-01-15T10:30:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-15");

        assert!(parse_slurm_timestamp("N/A").is_none());
        assert!(parse_slurm_timestamp("Unknown").is_none());
        assert!(parse_slurm_timestamp("None").is_none());
        assert!(parse_slurm_timestamp("").is_none());
    }

    #[test]
    fn test_recover_date_time_explicit_year() {
        assert_eq!(
            recover_date_time_from("Fri", "Dec 18 10:30:00", Some(2020), 2026).unwrap(),
            "2020-12-18 10:30:00"
        );
        // The weekday is not consulted when the year is known
        assert_eq!(
            recover_date_time_from("Mon", "Dec 18 10:30", Some(2024), 2026).unwrap(),
            "2024-12-18 10:30:00"
        );
        assert!(matches!(
            recover_date_time_from("Mon", "garbage", Some(2024), 2026),
            Err(DateError::InvalidStamp(_))
        ));
    }

    #[test]
    fn test_recover_date_time_searches_backwards() {
        // Jan 3rd was a Saturday in 2026, a Friday in 2025 and a Wednesday in 2024
        assert_eq!(
            recover_date_time_from("Wed", "Jan 03 10:15:00", None, 2026).unwrap(),
            "2024-01-03 10:15:00"
        );
        assert_eq!(
            recover_date_time_from("Saturday", "Jan 03 10:15:00", None, 2026).unwrap(),
            "2026-01-03 10:15:00"
        );
    }

    #[test]
    fn test_recover_date_time_padded_day() {
        assert_eq!(
            recover_date_time_from("Wed", "Jan  3 10:15", None, 2026).unwrap(),
            "2024-01-03 10:15:00"
        );
    }

    #[test]
    fn test_recover_date_time_leap_day() {
        // 2024 is the only leap year since 2021; Feb 29 2024 was a Thursday
        assert_eq!(
            recover_date_time_from("Thu", "Feb 29 08:00:00", None, 2026).unwrap(),
            "2024-02-29 08:00:00"
        );
    }

    #[test]
    fn test_recover_date_time_not_recoverable() {
        assert!(matches!(
            recover_date_time_from("Wed", "Feb 30 10:15:00", None, 2026),
            Err(DateError::YearNotRecoverable { years: 28, .. })
        ));
        assert!(matches!(
            recover_date_time_from("Someday", "Jan 03 10:15:00", None, 2026),
            Err(DateError::InvalidWeekday(_))
        ));
    }

    #[test]
    fn test_recovered_date_time_is_none_on_failure() {
        assert_eq!(
            recovered_date_time("Wed", "Dec 18 10:30", Some(2024)),
            Some("2024-12-18 10:30:00".to_string())
        );
        assert_eq!(recovered_date_time("Thu", "Feb 30 10:00:00", None), None);
        assert_eq!(recovered_date_time("Someday", "Jan 03 10:15", None), None);
        assert_eq!(recovered_date_time("Wed", "garbage", Some(2024)), None);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1:00:00"), Some(Duration::from_secs(3600)));
        assert_eq!(
            parse_duration("1-00:00:00"),
            Some(Duration::from_secs(86400))
        );
        assert_eq!(parse_duration("30:00"), Some(Duration::from_secs(1800)));
        assert_eq!(parse_duration("3600"), Some(Duration::from_secs(3600)));
        assert!(parse_duration("UNLIMITED").is_none());
        assert!(parse_duration("-").is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(330), "05:30");
        assert_eq!(format_duration(5400), "01:30:00");
        assert_eq!(format_duration(2 * 86400 + 3600), "2d 01:00:00");
    }
}
