//! Request window planning.
//!
//! Turns the optional `--from` / `--to` dates into the end time and duration
//! the historical data API expects. Without an explicit end time the API
//! answers "up to now", which truncates the current session, so every plan
//! carries a concrete end.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::duration::HistoryDuration;
use crate::error::{RequestError, Result};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d"];

/// Format of the end time sent to the API.
pub const API_END_FORMAT: &str = "%Y%m%d %H:%M:%S";

/// Regular session close (16:00 market time).
const RTH_CLOSE_HOUR: u32 = 16;
/// Extended hours end (02:00 the following day).
const ETH_CLOSE_HOUR: u32 = 2;

/// How the window was derived from the arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowMode {
    /// Both start and end given; duration computed from the span.
    DateRange { start: String, end: String },
    /// Only a start date; a single day is requested.
    SingleDay { date: String },
    /// Only an end date; the default duration ends there.
    DurationWithEnd { end: String },
    /// No dates; the default duration ends at today's close.
    DurationOnly,
}

/// Planned request window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestWindow {
    /// End of the window, naive market time.
    pub end: NaiveDateTime,
    pub duration: HistoryDuration,
    pub mode: WindowMode,
}

impl RequestWindow {
    /// End time in the API's `yyyymmdd hh:mm:ss` form.
    #[must_use]
    pub fn end_text(&self) -> String {
        self.end.format(API_END_FORMAT).to_string()
    }
}

/// Parses a date in one of the accepted formats.
///
/// # Errors
/// Returns [`RequestError::InvalidDate`] if no format matches.
pub fn parse_date(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    for fmt in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(dt);
        }
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Ok(d.and_time(NaiveTime::MIN));
        }
    }
    Err(RequestError::InvalidDate(text.to_string()))
}

/// End of the session containing `dt`.
///
/// A value with an explicit time of day is kept as is. A bare date is moved
/// to the regular close, or to 02:00 the next day when extended hours are
/// requested so that the post-market session is included.
#[must_use]
pub fn session_end(dt: NaiveDateTime, extended_hours: bool) -> NaiveDateTime {
    if dt.time() != NaiveTime::MIN {
        return dt;
    }
    let date = dt.date();
    if extended_hours {
        (date + Duration::days(1)).and_time(hms(ETH_CLOSE_HOUR))
    } else {
        date.and_time(hms(RTH_CLOSE_HOUR))
    }
}

fn hms(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Duration covering `start..=end` in whole days, switching to years past 365 days.
#[must_use]
pub fn span_duration(start: NaiveDateTime, end: NaiveDateTime) -> HistoryDuration {
    let days = (end - start).num_days() + 1;
    let days = u32::try_from(days.max(1)).unwrap_or(u32::MAX);
    if days <= 365 {
        HistoryDuration::days(days)
    } else {
        HistoryDuration::years(days / 365)
    }
}

/// Plans the request window.
///
/// `today` is the calendar date used when no dates are given.
///
/// # Errors
/// Returns an error when a date cannot be parsed or start is after end.
pub fn plan_window(
    start: Option<&str>,
    end: Option<&str>,
    default_duration: HistoryDuration,
    extended_hours: bool,
    today: NaiveDate,
) -> Result<RequestWindow> {
    let start_dt = start.map(parse_date).transpose()?;
    let end_dt = end.map(parse_date).transpose()?;

    let window = match (start_dt, end_dt) {
        (Some(s), Some(e)) => {
            if s > e {
                return Err(RequestError::StartAfterEnd);
            }
            RequestWindow {
                end: session_end(e, extended_hours),
                duration: span_duration(s, e),
                mode: WindowMode::DateRange {
                    start: start.unwrap_or_default().to_string(),
                    end: end.unwrap_or_default().to_string(),
                },
            }
        }
        (Some(s), None) => RequestWindow {
            end: session_end(s, extended_hours),
            duration: HistoryDuration::days(1),
            mode: WindowMode::SingleDay {
                date: start.unwrap_or_default().to_string(),
            },
        },
        (None, Some(e)) => RequestWindow {
            end: session_end(e, extended_hours),
            duration: default_duration,
            mode: WindowMode::DurationWithEnd {
                end: end.unwrap_or_default().to_string(),
            },
        },
        (None, None) => RequestWindow {
            end: session_end(today.and_time(NaiveTime::MIN), extended_hours),
            duration: default_duration,
            mode: WindowMode::DurationOnly,
        },
    };

    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 6, 10)
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(
            parse_date("2024-01-15").unwrap(),
            date(2024, 1, 15).and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_date("2024-01-15 09:30").unwrap(),
            date(2024, 1, 15).and_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_date("2024-01-15 09:30:15").unwrap(),
            date(2024, 1, 15).and_hms_opt(9, 30, 15).unwrap()
        );
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(matches!(
            parse_date("01/15/2024"),
            Err(RequestError::InvalidDate(_))
        ));
        assert!(parse_date("2024-13-01").is_err());
    }

    #[test]
    fn test_neither_date_ends_today_at_close() {
        let w = plan_window(None, None, HistoryDuration::years(1), false, today()).unwrap();
        assert_eq!(w.end_text(), "20240610 16:00:00");
        assert_eq!(w.duration.to_string(), "1 Y");
        assert_eq!(w.mode, WindowMode::DurationOnly);
    }

    #[test]
    fn test_neither_date_extended_hours_ends_next_morning() {
        let w = plan_window(None, None, HistoryDuration::days(30), true, today()).unwrap();
        assert_eq!(w.end_text(), "20240611 02:00:00");
        assert_eq!(w.duration.to_string(), "30 D");
    }

    #[test]
    fn test_start_only_is_single_day() {
        let w = plan_window(Some("2024-01-15"), None, HistoryDuration::years(1), false, today())
            .unwrap();
        assert_eq!(w.end_text(), "20240115 16:00:00");
        assert_eq!(w.duration.to_string(), "1 D");
        assert_eq!(
            w.mode,
            WindowMode::SingleDay {
                date: "2024-01-15".to_string()
            }
        );

        let eth = plan_window(Some("2024-01-15"), None, HistoryDuration::years(1), true, today())
            .unwrap();
        assert_eq!(eth.end_text(), "20240116 02:00:00");
    }

    #[test]
    fn test_start_with_time_is_kept() {
        let w = plan_window(
            Some("2024-01-15 12:00"),
            None,
            HistoryDuration::years(1),
            false,
            today(),
        )
        .unwrap();
        assert_eq!(w.end_text(), "20240115 12:00:00");
    }

    #[test]
    fn test_date_range_in_days() {
        let w = plan_window(
            Some("2024-01-01"),
            Some("2024-01-31"),
            HistoryDuration::years(1),
            false,
            today(),
        )
        .unwrap();
        assert_eq!(w.duration.to_string(), "31 D");
        assert_eq!(w.end_text(), "20240131 16:00:00");
    }

    #[test]
    fn test_same_day_range_is_one_day() {
        let w = plan_window(
            Some("2024-01-15"),
            Some("2024-01-15"),
            HistoryDuration::years(1),
            false,
            today(),
        )
        .unwrap();
        assert_eq!(w.duration.to_string(), "1 D");
    }

    #[test]
    fn test_long_range_switches_to_years() {
        let w = plan_window(
            Some("2020-01-01"),
            Some("2023-01-01"),
            HistoryDuration::days(30),
            false,
            today(),
        )
        .unwrap();
        // 1097 days
        assert_eq!(w.duration.to_string(), "3 Y");
    }

    #[test]
    fn test_range_start_after_end_fails() {
        let err = plan_window(
            Some("2024-02-01"),
            Some("2024-01-01"),
            HistoryDuration::years(1),
            false,
            today(),
        )
        .unwrap_err();
        assert_eq!(err, RequestError::StartAfterEnd);
    }

    #[test]
    fn test_end_only_uses_default_duration() {
        let w = plan_window(
            None,
            Some("2024-12-31"),
            HistoryDuration::days(30),
            false,
            today(),
        )
        .unwrap();
        assert_eq!(w.duration.to_string(), "30 D");
        assert_eq!(w.end_text(), "20241231 16:00:00");
        assert!(matches!(w.mode, WindowMode::DurationWithEnd { .. }));
    }

    #[test]
    fn test_invalid_date_propagates() {
        assert!(plan_window(Some("yesterday"), None, HistoryDuration::default(), false, today())
            .is_err());
    }
}
