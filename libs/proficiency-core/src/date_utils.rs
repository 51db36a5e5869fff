//! Date utilities for per-learner study days.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

/// Largest offset accepted from a client, in minutes (UTC-14:00 to UTC+14:00).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Get the learner's calendar date for an instant.
///
/// Day boundaries follow the learner's clock, so practice at 23:30 local time
/// counts towards that local day. Offsets outside ±14h are clamped.
pub fn study_date(now: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    let minutes = utc_offset_minutes.clamp(-MAX_UTC_OFFSET_MINUTES, MAX_UTC_OFFSET_MINUTES);
    match FixedOffset::east_opt(minutes * 60) {
        Some(offset) => now.with_timezone(&offset).date_naive(),
        None => (now + Duration::minutes(i64::from(minutes))).date_naive(),
    }
}

/// Reporting window reaching `days` back from `today`, both ends inclusive.
pub fn trailing_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(i64::from(days)), today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn utc_learner_uses_utc_date() {
        let date = study_date(instant("2026-05-01T23:30:00Z"), 0);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
    }

    #[test]
    fn positive_offset_rolls_forward() {
        // 23:30 UTC is 08:30 the next day in UTC+9
        let date = study_date(instant("2026-05-01T23:30:00Z"), 540);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 5, 2).unwrap());
    }

    #[test]
    fn negative_offset_rolls_back() {
        let date = study_date(instant("2026-05-02T03:00:00Z"), -300);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
    }

    #[test]
    fn thirty_day_window() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 31).unwrap();
        let (start, end) = trailing_window(today, 30);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
        assert_eq!(end, today);
    }
}
