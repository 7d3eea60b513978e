use chrono::{DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, Offset, Utc};
use chrono_tz::Tz;
use std::fmt;

/// Where calendar days are cut. Named and host zones resolve the offset per
/// instant, so daylight-saving changes move midnight with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Fixed(FixedOffset),
    Named(Tz),
    HostLocal,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Fixed(offset) => write!(f, "{}", offset),
            Zone::Named(tz) => write!(f, "{}", tz.name()),
            Zone::HostLocal => write!(f, "host-local"),
        }
    }
}

/// Maps instants onto calendar days in one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    zone: Zone,
    week_start: chrono::Weekday,
}

impl Calendar {
    pub fn new(offset: FixedOffset, week_start: chrono::Weekday) -> Self {
        Self::in_zone(Zone::Fixed(offset), week_start)
    }

    pub fn in_zone(zone: Zone, week_start: chrono::Weekday) -> Self {
        Self { zone, week_start }
    }

    /// UTC days, weeks starting on Sunday.
    pub fn utc() -> Self {
        Self::new(Utc.fix(), chrono::Weekday::Sun)
    }

    /// Follows the host's local time zone, including DST transitions.
    pub fn host(week_start: chrono::Weekday) -> Self {
        Self::in_zone(Zone::HostLocal, week_start)
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn week_start(&self) -> chrono::Weekday {
        self.week_start
    }

    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self.zone {
            Zone::Fixed(offset) => instant.with_timezone(&offset).date_naive(),
            Zone::Named(tz) => instant.with_timezone(&tz).date_naive(),
            Zone::HostLocal => instant.with_timezone(&Local).date_naive(),
        }
    }

    pub fn is_same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.day_of(a) == self.day_of(b)
    }

    pub fn days_ago(day: NaiveDate, n: i64) -> NaiveDate {
        day - Duration::days(n)
    }

    pub fn start_of_week(&self, day: NaiveDate) -> NaiveDate {
        let back = (7 + day.weekday().num_days_from_sunday() as i64
            - self.week_start.num_days_from_sunday() as i64)
            % 7;
        day - Duration::days(back)
    }

    /// Half-open `[start, start + 7 days)` window containing `day`.
    pub fn week_window(&self, day: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = self.start_of_week(day);
        (start, start + Duration::days(7))
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_of_respects_offset() {
        let tokyo = Calendar::new(FixedOffset::east_opt(9 * 3600).unwrap(), chrono::Weekday::Sun);
        // 2026-03-04 20:00 UTC is already 2026-03-05 in UTC+9.
        let instant = day(2026, 3, 4).and_hms_opt(20, 0, 0).unwrap().and_utc();
        assert_eq!(Calendar::utc().day_of(instant), day(2026, 3, 4));
        assert_eq!(tokyo.day_of(instant), day(2026, 3, 5));
    }

    #[test]
    fn test_named_zone_follows_dst() {
        let ny = Calendar::in_zone(Zone::Named(chrono_tz::America::New_York), chrono::Weekday::Sun);
        // 23:30 local on both sides of the 2026-11-01 fall-back: EDT (-4) then EST (-5).
        let before = day(2026, 10, 31).and_hms_opt(3, 30, 0).unwrap().and_utc();
        let after = day(2026, 11, 11).and_hms_opt(4, 30, 0).unwrap().and_utc();
        assert_eq!(ny.day_of(before), day(2026, 10, 30));
        assert_eq!(ny.day_of(after), day(2026, 11, 10));

        // Same around the 2026-03-08 spring-forward.
        let before = day(2026, 3, 8).and_hms_opt(4, 30, 0).unwrap().and_utc();
        let after = day(2026, 3, 10).and_hms_opt(3, 30, 0).unwrap().and_utc();
        assert_eq!(ny.day_of(before), day(2026, 3, 7));
        assert_eq!(ny.day_of(after), day(2026, 3, 9));
    }

    #[test]
    fn test_fixed_offset_ignores_dst() {
        let edt = Calendar::new(FixedOffset::west_opt(4 * 3600).unwrap(), chrono::Weekday::Sun);
        let after = day(2026, 11, 11).and_hms_opt(4, 30, 0).unwrap().and_utc();
        assert_eq!(edt.day_of(after), day(2026, 11, 11));
    }

    #[test]
    fn test_host_zone_matches_local_conversion() {
        let cal = Calendar::host(chrono::Weekday::Sun);
        for instant in [
            day(2026, 3, 8).and_hms_opt(6, 59, 0).unwrap().and_utc(),
            day(2026, 7, 1).and_hms_opt(23, 30, 0).unwrap().and_utc(),
            day(2026, 11, 1).and_hms_opt(5, 30, 0).unwrap().and_utc(),
        ] {
            assert_eq!(cal.day_of(instant), instant.with_timezone(&Local).date_naive());
        }
    }

    #[test]
    fn test_is_same_day() {
        let cal = Calendar::utc();
        let morning = day(2026, 3, 4).and_hms_opt(0, 5, 0).unwrap().and_utc();
        let night = day(2026, 3, 4).and_hms_opt(23, 55, 0).unwrap().and_utc();
        let next = day(2026, 3, 5).and_hms_opt(0, 0, 1).unwrap().and_utc();
        assert!(cal.is_same_day(morning, night));
        assert!(!cal.is_same_day(night, next));
    }

    #[test]
    fn test_days_ago_crosses_month() {
        assert_eq!(Calendar::days_ago(day(2026, 3, 2), 3), day(2026, 2, 27));
    }

    #[test]
    fn test_start_of_week_sunday() {
        let cal = Calendar::utc();
        // 2026-03-04 is a Wednesday
        assert_eq!(cal.start_of_week(day(2026, 3, 4)), day(2026, 3, 1));
        assert_eq!(cal.start_of_week(day(2026, 3, 1)), day(2026, 3, 1));
        assert_eq!(cal.start_of_week(day(2026, 3, 7)), day(2026, 3, 1));
    }

    #[test]
    fn test_start_of_week_monday() {
        let cal = Calendar::new(Utc.fix(), chrono::Weekday::Mon);
        assert_eq!(cal.start_of_week(day(2026, 3, 4)), day(2026, 3, 2));
        // Sunday belongs to the week that began the previous Monday
        assert_eq!(cal.start_of_week(day(2026, 3, 8)), day(2026, 3, 2));
    }

    #[test]
    fn test_week_window_is_seven_days() {
        let (start, end) = Calendar::utc().week_window(day(2026, 3, 4));
        assert_eq!(start, day(2026, 3, 1));
        assert_eq!(end, day(2026, 3, 8));
    }
}
