use chrono::NaiveDate;
use serde::Serialize;

use crate::engine::calendar::Calendar;
use crate::models::mission::Mission;

/// One planet per this many completions.
pub const COMPLETIONS_PER_PLANET: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub overall_streak: i32,
    pub planets_discovered: i64,
    pub fuel_percentage: f64,
}

pub fn aggregate(missions: &[Mission], todays_missions: &[&Mission], completed_today_count: usize) -> ProgressStats {
    let overall_streak = missions.iter().map(|m| m.current_streak).max().unwrap_or(0);

    let total_completions: i64 = missions.iter().map(|m| m.total_completions as i64).sum();
    let planets_discovered = (total_completions / COMPLETIONS_PER_PLANET).max(1);

    let fuel_percentage = if todays_missions.is_empty() {
        0.0
    } else {
        (100.0 * completed_today_count as f64 / todays_missions.len() as f64).clamp(0.0, 100.0)
    };

    ProgressStats {
        overall_streak,
        planets_discovered,
        fuel_percentage,
    }
}

/// Missions from `todays_missions` that already have a completed entry for `today`.
pub fn completed_today_count(todays_missions: &[&Mission], today: NaiveDate, calendar: &Calendar) -> usize {
    todays_missions
        .iter()
        .filter(|m| m.is_completed_on(today, calendar))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::mission::fixtures::{entry, mission};
    use crate::models::mission::{MissionType, Weekday};

    fn with_counts(current_streak: i32, total_completions: i32) -> Mission {
        let mut m = mission(MissionType::Daily, vec![Weekday::Monday]);
        m.current_streak = current_streak;
        m.total_completions = total_completions;
        m
    }

    #[test]
    fn test_no_missions() {
        let stats = aggregate(&[], &[], 0);
        assert_eq!(stats.overall_streak, 0);
        assert_eq!(stats.planets_discovered, 1);
        assert_eq!(stats.fuel_percentage, 0.0);
    }

    #[test]
    fn test_overall_streak_is_max() {
        let missions = vec![with_counts(2, 0), with_counts(7, 0), with_counts(0, 0)];
        assert_eq!(aggregate(&missions, &[], 0).overall_streak, 7);
    }

    #[test]
    fn test_planets_milestone() {
        let missions = vec![with_counts(0, 10), with_counts(0, 13)];
        assert_eq!(aggregate(&missions, &[], 0).planets_discovered, 4);

        let missions = vec![with_counts(0, 0)];
        assert_eq!(aggregate(&missions, &[], 0).planets_discovered, 1);
    }

    #[test]
    fn test_fuel_percentage() {
        let missions: Vec<Mission> = (0..4).map(|_| with_counts(0, 0)).collect();
        let todays: Vec<&Mission> = missions.iter().collect();
        assert_eq!(aggregate(&missions, &todays, 2).fuel_percentage, 50.0);
        assert_eq!(aggregate(&missions, &[], 2).fuel_percentage, 0.0);
    }

    #[test]
    fn test_fuel_percentage_is_clamped() {
        let missions = vec![with_counts(0, 0)];
        let todays: Vec<&Mission> = missions.iter().collect();
        assert_eq!(aggregate(&missions, &todays, 3).fuel_percentage, 100.0);
    }

    #[test]
    fn test_completed_today_count_reads_log() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let mut done = mission(MissionType::Daily, vec![Weekday::Wednesday]);
        done.completion_log = vec![entry(today, true)];
        let mut undone = mission(MissionType::Daily, vec![Weekday::Wednesday]);
        undone.completion_log = vec![entry(today, false)];
        let untouched = mission(MissionType::Daily, vec![Weekday::Wednesday]);

        let todays = vec![&done, &undone, &untouched];
        assert_eq!(completed_today_count(&todays, today, &Calendar::utc()), 1);
    }
}
