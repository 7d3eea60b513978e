use chrono::NaiveDate;
use std::collections::HashSet;

use crate::engine::calendar::Calendar;
use crate::models::mission::CompletionEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakSummary {
    pub current_streak: i32,
    pub best_streak: i32,
    pub total_completions: i32,
}

/// Recompute streak counters from the completion log.
///
/// The current streak counts back from `today` and stops at the first day
/// without a completed entry; a streak that does not include `today` is 0.
/// `best_streak` never drops below `previous_best`.
pub fn recalculate(
    log: &[CompletionEntry],
    today: NaiveDate,
    previous_best: i32,
    calendar: &Calendar,
) -> StreakSummary {
    let completed: Vec<NaiveDate> = log
        .iter()
        .filter(|entry| entry.was_completed)
        .map(|entry| calendar.day_of(entry.date))
        .collect();
    let total_completions = completed.len() as i32;
    let completed_days: HashSet<NaiveDate> = completed.into_iter().collect();

    let mut current_streak = 0;
    if completed_days.contains(&today) {
        current_streak = 1;
        let mut cursor = Calendar::days_ago(today, 1);
        while completed_days.contains(&cursor) {
            current_streak += 1;
            cursor = Calendar::days_ago(cursor, 1);
        }
    }

    StreakSummary {
        current_streak,
        best_streak: previous_best.max(current_streak),
        total_completions,
    }
}
