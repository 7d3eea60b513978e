use chrono::{Datelike, NaiveDate};

use crate::engine::calendar::Calendar;
use crate::models::mission::{Mission, MissionType, Weekday};

/// Whether `mission` belongs on the board for `today`.
///
/// Paused missions are never due. Weekly missions are due until one
/// completed entry lands inside the current week window; daily missions are
/// due on the weekdays listed in `frequency`.
pub fn is_due_today(mission: &Mission, today: NaiveDate, now_weekday: Weekday, calendar: &Calendar) -> bool {
    if !mission.is_active {
        return false;
    }

    match mission.mission_type {
        MissionType::Weekly => {
            let (week_start, week_end) = calendar.week_window(today);
            let done_this_week = mission.completion_log.iter().any(|entry| {
                let day = calendar.day_of(entry.date);
                entry.was_completed && day >= week_start && day < week_end
            });
            !done_this_week
        }
        MissionType::Daily => mission.frequency.contains(&now_weekday),
    }
}

/// The subset of `missions` due on `today`, in input order.
pub fn todays_missions<'a>(missions: &'a [Mission], today: NaiveDate, calendar: &Calendar) -> Vec<&'a Mission> {
    let weekday = Weekday::from(today.weekday());
    missions
        .iter()
        .filter(|m| is_due_today(m, today, weekday, calendar))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mission::fixtures::{entry, mission};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-03-04 is a Wednesday
    fn wednesday() -> NaiveDate {
        day(2026, 3, 4)
    }

    #[test]
    fn test_paused_mission_is_never_due() {
        let mut m = mission(MissionType::Daily, Weekday::ALL.to_vec());
        m.is_active = false;
        assert!(!is_due_today(&m, wednesday(), Weekday::Wednesday, &Calendar::utc()));
    }

    #[test]
    fn test_daily_mission_due_on_listed_weekday() {
        let m = mission(
            MissionType::Daily,
            vec![Weekday::Monday, Weekday::Wednesday, Weekday::Friday],
        );
        let cal = Calendar::utc();
        assert!(is_due_today(&m, wednesday(), Weekday::Wednesday, &cal));
        assert!(!is_due_today(&m, day(2026, 3, 5), Weekday::Thursday, &cal));
    }

    #[test]
    fn test_weekly_mission_done_two_days_ago_is_not_due() {
        let mut m = mission(MissionType::Weekly, vec![Weekday::Sunday]);
        m.completion_log = vec![entry(day(2026, 3, 2), true)];
        assert!(!is_due_today(&m, wednesday(), Weekday::Wednesday, &Calendar::utc()));
    }

    #[test]
    fn test_weekly_mission_done_nine_days_ago_is_due() {
        let mut m = mission(MissionType::Weekly, vec![Weekday::Sunday]);
        m.completion_log = vec![entry(day(2026, 2, 23), true)];
        assert!(is_due_today(&m, wednesday(), Weekday::Wednesday, &Calendar::utc()));
    }

    #[test]
    fn test_weekly_mission_ignores_unchecked_entries() {
        let mut m = mission(MissionType::Weekly, vec![Weekday::Sunday]);
        m.completion_log = vec![entry(day(2026, 3, 3), false)];
        assert!(is_due_today(&m, wednesday(), Weekday::Wednesday, &Calendar::utc()));
    }

    #[test]
    fn test_weekly_frequency_placeholder_is_ignored() {
        // Placeholder says Sunday, but weekly missions are due any day.
        let m = mission(MissionType::Weekly, vec![Weekday::Sunday]);
        assert!(is_due_today(&m, wednesday(), Weekday::Wednesday, &Calendar::utc()));
    }

    #[test]
    fn test_todays_missions_keeps_order() {
        let mut a = mission(MissionType::Daily, vec![Weekday::Wednesday]);
        a.id = "a".into();
        let mut b = mission(MissionType::Daily, vec![Weekday::Thursday]);
        b.id = "b".into();
        let mut c = mission(MissionType::Weekly, vec![Weekday::Sunday]);
        c.id = "c".into();
        let all = vec![a, b, c];

        let due: Vec<&str> = todays_missions(&all, wednesday(), &Calendar::utc())
            .into_iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(due, vec!["a", "c"]);
    }
}
