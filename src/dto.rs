//! # Mission Control — Request/Response DTOs
//!
//! API contract types in one module. Mission JSON keeps the persisted record
//! layout (camelCase field names) and adds presentation-only fields.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body or query params
//! - `*Response` → serialized to client JSON
//! - Field limits are expressed via `validator` derive macros
//! - Derived counters (`currentStreak`, `bestStreak`, ...) never appear in
//!   requests; unknown fields are ignored, so client-sent values are dropped

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::engine::calendar::Calendar;
use crate::engine::progress::ProgressStats;
use crate::engine::schedule::is_due_today;
use crate::models::mission::{Mission, MissionCategory, MissionType, Weekday};

// ============================================================================
// Missions
// ============================================================================

/// POST /api/missions
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMissionRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub category: MissionCategory,

    #[serde(rename = "type", default)]
    pub mission_type: MissionType,

    /// Defaults to today's calendar day.
    pub start_date: Option<NaiveDate>,

    /// Required (non-empty) for daily missions, ignored for weekly ones.
    #[serde(default)]
    pub frequency: Vec<Weekday>,

    #[validate(range(min = 1, max = 100, message = "goalPerDay must be between 1 and 100"))]
    pub goal_per_day: Option<i32>,

    pub preferred_time_of_day: Option<NaiveTime>,

    /// When absent, a single reminder is derived from `preferredTimeOfDay`.
    pub reminders: Option<Vec<ReminderRequest>>,
}

/// PUT /api/missions/:id — absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMissionRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub mission_type: Option<MissionType>,

    pub frequency: Option<Vec<Weekday>>,

    #[validate(range(min = 1, max = 100, message = "goalPerDay must be between 1 and 100"))]
    pub goal_per_day: Option<i32>,

    pub preferred_time_of_day: Option<NaiveTime>,

    pub reminders: Option<Vec<ReminderRequest>>,

    pub is_active: Option<bool>,

    /// Version the client last saw; a mismatch is rejected with 409.
    pub version: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub id: Option<String>,
    pub time: NaiveTime,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionFilter {
    #[default]
    All,
    Active,
    Paused,
}

impl MissionFilter {
    pub fn matches(&self, mission: &Mission) -> bool {
        match self {
            Self::All => true,
            Self::Active => mission.is_active,
            Self::Paused => !mission.is_active,
        }
    }
}

/// GET /api/missions?status=
#[derive(Debug, Deserialize)]
pub struct ListMissionsQuery {
    #[serde(default)]
    pub status: MissionFilter,
}

/// A mission plus the per-day status the mission cards render.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionWithStatus {
    #[serde(flatten)]
    pub mission: Mission,
    pub category_icon: &'static str,
    pub frequency_summary: String,
    pub is_due_today: bool,
    pub completed_today: bool,
}

impl MissionWithStatus {
    pub fn new(mission: Mission, today: NaiveDate, calendar: &Calendar) -> Self {
        let is_due_today = is_due_today(&mission, today, Weekday::from(today.weekday()), calendar);
        Self {
            category_icon: mission.category.icon_name(),
            frequency_summary: mission.frequency_summary(),
            completed_today: mission.is_completed_on(today, calendar),
            is_due_today,
            mission,
        }
    }
}

/// POST /api/missions/:id/toggle
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub action: ToggleAction,
    pub mission: MissionWithStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Completed,
    Uncompleted,
}

/// Standard delete confirmation
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: String,
}

// ============================================================================
// Progress
// ============================================================================

/// GET /api/progress
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub stats: ProgressStats,
    pub completed_today: usize,
    pub todays_missions: Vec<MissionWithStatus>,
}
