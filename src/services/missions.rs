use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::dto::{CreateMissionRequest, MissionFilter, ReminderRequest, UpdateMissionRequest};
use crate::engine::calendar::Calendar;
use crate::engine::progress::{self, ProgressStats};
use crate::engine::schedule::todays_missions;
use crate::engine::streak;
use crate::engine::toggle::toggle_completion;
use crate::error::{AppError, AppResult};
use crate::models::mission::{Mission, MissionReminder, MissionType, Weekday};
use crate::services::notifications::Notifier;
use crate::store::{MissionStore, StoreError};

#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    /// Read-modify-write attempts before a version conflict is surfaced.
    pub toggle_max_attempts: u32,
    /// Smallest current streak that triggers a streak alert.
    pub streak_alert_min: i32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            toggle_max_attempts: 3,
            streak_alert_min: 3,
        }
    }
}

/// Cross-mission stats plus the board they were computed from.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub stats: ProgressStats,
    pub todays_missions: Vec<Mission>,
    pub completed_today: usize,
}

/// Caller of the progress engine: owns the store round trips, ownership
/// checks and the conflict-retry loop around every mutation.
#[derive(Clone)]
pub struct MissionService {
    store: Arc<dyn MissionStore>,
    notifier: Arc<dyn Notifier>,
    calendar: Calendar,
    settings: ServiceSettings,
}

impl MissionService {
    pub fn new(
        store: Arc<dyn MissionStore>,
        notifier: Arc<dyn Notifier>,
        calendar: Calendar,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            calendar,
            settings,
        }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await?;
        Ok(())
    }

    pub async fn list(
        &self,
        user_id: &str,
        filter: MissionFilter,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Mission>> {
        let today = self.calendar.day_of(now);
        let missions = self.store.fetch_missions(user_id).await?;
        Ok(missions
            .into_iter()
            .filter(|m| filter.matches(m))
            .map(|m| self.with_current_streaks(m, today))
            .collect())
    }

    pub async fn get(&self, user_id: &str, id: &str, now: DateTime<Utc>) -> AppResult<Mission> {
        let mission = self.fetch_owned(user_id, id).await?;
        Ok(self.with_current_streaks(mission, self.calendar.day_of(now)))
    }

    /// Stored record as-is, after the ownership check.
    async fn fetch_owned(&self, user_id: &str, id: &str) -> AppResult<Mission> {
        let mission = self
            .store
            .fetch_mission(id)
            .await?
            .ok_or(AppError::NotFound("Mission not found".into()))?;

        if !mission.is_owned_by(user_id) {
            tracing::warn!(mission_id = %id, user_id = %user_id, "Mission access denied");
            return Err(AppError::Forbidden);
        }

        Ok(mission)
    }

    pub async fn create(
        &self,
        user_id: &str,
        body: CreateMissionRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Mission> {
        let frequency = match body.mission_type {
            MissionType::Daily => normalized_days(body.frequency),
            // Weekly missions ignore weekdays; store the placeholder.
            MissionType::Weekly => vec![Weekday::Sunday],
        };

        let reminders = match body.reminders {
            Some(reminders) => reminders.into_iter().map(reminder_from_request).collect(),
            None => body
                .preferred_time_of_day
                .map(|time| vec![derived_reminder(time)])
                .unwrap_or_default(),
        };

        let mission = Mission {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: body.name.trim().to_string(),
            category: body.category,
            mission_type: body.mission_type,
            start_date: body
                .start_date
                .unwrap_or_else(|| self.calendar.day_of(now)),
            frequency,
            goal_per_day: body.goal_per_day.unwrap_or(1),
            preferred_time_of_day: body.preferred_time_of_day,
            is_active: true,
            reminders,
            current_streak: 0,
            best_streak: 0,
            total_completions: 0,
            missed_days: 0,
            last_completed: None,
            completion_log: Vec::new(),
            version: 0,
        };
        mission.validate(&self.calendar)?;

        self.store.create_mission(&mission).await?;
        tracing::info!(mission_id = %mission.id, user_id = %user_id, "Mission created");

        self.schedule_reminders(&mission).await;
        Ok(mission)
    }

    pub async fn update(&self, user_id: &str, id: &str, body: UpdateMissionRequest) -> AppResult<Mission> {
        let updated = self
            .modify(user_id, id, |current| {
                if let Some(expected) = body.version {
                    if expected != current.version {
                        return Err(AppError::Conflict(format!(
                            "Mission {} is at version {}, not {}",
                            id, current.version, expected
                        )));
                    }
                }

                let mut next = current.clone();
                if let Some(name) = &body.name {
                    next.name = name.trim().to_string();
                }
                if let Some(mission_type) = body.mission_type {
                    // The weekly placeholder is not a weekday choice.
                    if current.mission_type == MissionType::Weekly && mission_type == MissionType::Daily {
                        next.frequency = Vec::new();
                    }
                    next.mission_type = mission_type;
                }
                if let Some(frequency) = &body.frequency {
                    next.frequency = normalized_days(frequency.clone());
                }
                if next.mission_type == MissionType::Weekly {
                    next.frequency = vec![Weekday::Sunday];
                }
                if let Some(goal) = body.goal_per_day {
                    next.goal_per_day = goal;
                }
                if let Some(reminders) = &body.reminders {
                    next.reminders = reminders.iter().cloned().map(reminder_from_request).collect();
                }
                if let Some(time) = body.preferred_time_of_day {
                    let previous = current.preferred_time_of_day;
                    next.preferred_time_of_day = Some(time);
                    if body.reminders.is_none() {
                        // Reminders that followed the old preferred time move with it.
                        for reminder in next.reminders.iter_mut().filter(|r| Some(r.time) == previous) {
                            reminder.time = time;
                        }
                        if next.reminders.is_empty() {
                            next.reminders.push(derived_reminder(time));
                        }
                    }
                }
                if let Some(active) = body.is_active {
                    next.is_active = active;
                }

                next.validate(&self.calendar)?;
                Ok(next)
            })
            .await?;

        tracing::info!(mission_id = %id, version = updated.version, "Mission updated");

        let reminders_touched = body.reminders.is_some() || body.preferred_time_of_day.is_some();
        if reminders_touched || body.is_active == Some(true) {
            self.schedule_reminders(&updated).await;
        }
        Ok(updated)
    }

    /// Pause (`false`) or resume (`true`) a mission.
    pub async fn set_active(&self, user_id: &str, id: &str, active: bool) -> AppResult<Mission> {
        let updated = self
            .modify(user_id, id, |current| {
                let mut next = current.clone();
                next.is_active = active;
                Ok(next)
            })
            .await?;

        tracing::info!(mission_id = %id, active, "Mission activation changed");

        if active {
            self.schedule_reminders(&updated).await;
        }
        Ok(updated)
    }

    /// Flip today's completion for one mission and persist the result.
    pub async fn toggle_completion(&self, user_id: &str, id: &str, now: DateTime<Utc>) -> AppResult<Mission> {
        let calendar = self.calendar;
        let mut streak_before = 0;

        let updated = self
            .modify(user_id, id, |current| {
                current.validate(&calendar)?;
                streak_before = streak::recalculate(
                    &current.completion_log,
                    calendar.day_of(now),
                    current.best_streak,
                    &calendar,
                )
                .current_streak;
                Ok(toggle_completion(current, now, &calendar))
            })
            .await?;

        let today = calendar.day_of(now);
        tracing::info!(
            mission_id = %id,
            completed = updated.is_completed_on(today, &calendar),
            current_streak = updated.current_streak,
            best_streak = updated.best_streak,
            "Mission completion toggled"
        );

        if updated.current_streak > streak_before
            && updated.current_streak >= self.settings.streak_alert_min
        {
            if let Err(e) = self
                .notifier
                .send_streak_alert(&updated.name, updated.current_streak)
                .await
            {
                tracing::warn!(mission_id = %id, error = %e, "Streak alert failed");
            }
        }

        Ok(updated)
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        self.store.delete_mission(id, user_id).await?;
        tracing::info!(mission_id = %id, user_id = %user_id, "Mission deleted");
        Ok(())
    }

    pub async fn todays_missions(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<Vec<Mission>> {
        let today = self.calendar.day_of(now);
        let missions = self.fetch_current(user_id, today).await?;
        Ok(todays_missions(&missions, today, &self.calendar)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn progress(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<ProgressSnapshot> {
        let today = self.calendar.day_of(now);
        let missions = self.fetch_current(user_id, today).await?;

        let todays = todays_missions(&missions, today, &self.calendar);
        let completed_today = progress::completed_today_count(&todays, today, &self.calendar);
        let stats = progress::aggregate(&missions, &todays, completed_today);

        Ok(ProgressSnapshot {
            stats,
            todays_missions: todays.into_iter().cloned().collect(),
            completed_today,
        })
    }

    async fn fetch_current(&self, user_id: &str, today: NaiveDate) -> AppResult<Vec<Mission>> {
        let missions = self.store.fetch_missions(user_id).await?;
        Ok(missions
            .into_iter()
            .map(|m| self.with_current_streaks(m, today))
            .collect())
    }

    /// Stored streak counters date from the last toggle; a streak that
    /// no longer reaches `today` reads as broken.
    fn with_current_streaks(&self, mut mission: Mission, today: NaiveDate) -> Mission {
        let summary = streak::recalculate(
            &mission.completion_log,
            today,
            mission.best_streak,
            &self.calendar,
        );
        mission.current_streak = summary.current_streak;
        mission.best_streak = summary.best_streak;
        mission.total_completions = summary.total_completions;
        mission
    }

    /// Fetch, transform, conditional write. A version conflict re-reads and
    /// re-applies `apply` on the fresh snapshot, up to the configured limit.
    async fn modify<F>(&self, user_id: &str, id: &str, mut apply: F) -> AppResult<Mission>
    where
        F: FnMut(&Mission) -> AppResult<Mission>,
    {
        let max_attempts = self.settings.toggle_max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let current = self.fetch_owned(user_id, id).await?;
            let next = apply(&current)?;

            match self.store.update_mission(&next).await {
                Ok(stored) => return Ok(stored),
                Err(StoreError::Conflict { expected, .. }) if attempt < max_attempts => {
                    tracing::warn!(
                        mission_id = %id,
                        attempt,
                        expected_version = expected,
                        "Mission changed underneath us, retrying on a fresh snapshot"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Best effort: the mission is already stored, a scheduler outage only
    /// costs the reminder.
    async fn schedule_reminders(&self, mission: &Mission) {
        if !mission.is_active {
            return;
        }
        for reminder in mission.reminders.iter().filter(|r| r.is_enabled) {
            if let Err(e) = self
                .notifier
                .schedule_daily_reminder(&mission.id, &mission.name, reminder.time)
                .await
            {
                tracing::warn!(
                    mission_id = %mission.id,
                    reminder_id = %reminder.id,
                    error = %e,
                    "Failed to schedule reminder"
                );
            }
        }
    }
}

fn normalized_days(mut days: Vec<Weekday>) -> Vec<Weekday> {
    days.sort();
    days.dedup();
    days
}

fn derived_reminder(time: chrono::NaiveTime) -> MissionReminder {
    MissionReminder {
        id: Uuid::new_v4().to_string(),
        time,
        is_enabled: true,
    }
}

fn reminder_from_request(req: ReminderRequest) -> MissionReminder {
    MissionReminder {
        id: req.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        time: req.time,
        is_enabled: req.is_enabled,
    }
}
