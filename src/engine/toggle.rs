use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::calendar::Calendar;
use crate::engine::streak;
use crate::models::mission::{CompletionEntry, Mission};

/// Apply one tap on "today" to `mission` and return the updated record.
///
/// An existing entry for the day is replaced in place with its completion
/// flag flipped, so two taps on the same day cancel out. The first tap of a
/// day always appends a completed entry. `last_completed` only moves
/// forward: un-checking today leaves the previous value untouched.
pub fn toggle_completion(mission: &Mission, now: DateTime<Utc>, calendar: &Calendar) -> Mission {
    let today = calendar.day_of(now);
    let mut updated = mission.clone();

    match mission.entry_on(today, calendar) {
        Some((index, existing)) => {
            updated.completion_log[index] = CompletionEntry {
                id: existing.id.clone(),
                date: existing.date,
                was_completed: !existing.was_completed,
            };
        }
        None => updated.completion_log.push(CompletionEntry {
            id: Uuid::new_v4().to_string(),
            date: now,
            was_completed: true,
        }),
    }

    if updated.is_completed_on(today, calendar) {
        updated.last_completed = Some(now);
    }

    let summary = streak::recalculate(&updated.completion_log, today, updated.best_streak, calendar);
    updated.current_streak = summary.current_streak;
    updated.best_streak = summary.best_streak;
    updated.total_completions = summary.total_completions;

    updated
}
