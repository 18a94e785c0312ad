//! Calendar-date helpers.
//!
//! Dates travel through the system as ISO-8601 strings (`YYYY-MM-DD`) so that
//! partially-filled or imported records survive untouched. Everything that
//! computes with a date goes through [`parse_date`] and treats a failed parse
//! as "no date".

use chrono::{Datelike, Duration, Local, NaiveDate};

/// ISO calendar-date format used for every stored date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse an ISO date string. Blank or malformed input yields `None`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Format a date the way it is stored.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Monday of the week containing `date` (Monday is day 0).
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = (date.weekday().num_days_from_sunday() + 6) % 7;
    date - Duration::days(offset as i64)
}

/// Sunday closing the week that contains `date`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Duration::days(6)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-03-05"), NaiveDate::from_ymd_opt(2025, 3, 5));
        assert_eq!(parse_date(" 2025-03-05 "), NaiveDate::from_ymd_opt(2025, 3, 5));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2025-13-40"), None);
    }

    #[test]
    fn test_format_round_trip() {
        assert_eq!(format_date(d("2024-02-29")), "2024-02-29");
    }

    #[test]
    fn test_week_start() {
        // 2025-03-05 is a Wednesday
        assert_eq!(week_start(d("2025-03-05")), d("2025-03-03"));
        // Monday maps to itself
        assert_eq!(week_start(d("2025-03-03")), d("2025-03-03"));
        // Sunday belongs to the week that started six days earlier
        assert_eq!(week_start(d("2025-03-09")), d("2025-03-03"));
    }

    #[test]
    fn test_week_end() {
        assert_eq!(week_end(d("2025-03-05")), d("2025-03-09"));
        assert_eq!(week_end(d("2025-03-09")), d("2025-03-09"));
    }
}
