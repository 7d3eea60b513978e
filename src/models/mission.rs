use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::engine::calendar::Calendar;

pub const MAX_NAME_LEN: usize = 100;

/// A recurring habit definition together with its completion history.
///
/// `current_streak`, `best_streak` and `total_completions` are a display
/// cache; only the streak recalculator writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub category: MissionCategory,
    #[serde(rename = "type")]
    pub mission_type: MissionType,
    pub start_date: NaiveDate,
    pub frequency: Vec<Weekday>,
    pub goal_per_day: i32,
    pub preferred_time_of_day: Option<NaiveTime>,
    pub is_active: bool,
    pub reminders: Vec<MissionReminder>,

    pub current_streak: i32,
    pub best_streak: i32,
    pub total_completions: i32,
    pub missed_days: i32,
    pub last_completed: Option<DateTime<Utc>>,

    pub completion_log: Vec<CompletionEntry>,

    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mission_category", rename_all = "snake_case")]
pub enum MissionCategory {
    #[serde(rename = "Physical Training")]
    PhysicalTraining,
    #[serde(rename = "Mental Preparation")]
    MentalPreparation,
    #[serde(rename = "Skill Development")]
    SkillDevelopment,
    #[serde(rename = "Equipment Maintenance")]
    EquipmentMaintenance,
}

impl MissionCategory {
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::PhysicalTraining => "physical-training-icon",
            Self::MentalPreparation => "mental-prep-icon",
            Self::SkillDevelopment => "skill-dev-icon",
            Self::EquipmentMaintenance => "equipment-icon",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mission_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MissionType {
    Daily,
    Weekly,
}

impl Default for MissionType {
    fn default() -> Self {
        Self::Daily
    }
}

/// Day of week numbered Sunday = 1 through Saturday = 7 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Weekday {
    Sunday = 1,
    Monday = 2,
    Tuesday = 3,
    Wednesday = 4,
    Thursday = 5,
    Friday = 6,
    Saturday = 7,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sunday => "Sunday",
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Self::ALL[day.num_days_from_sunday() as usize]
    }
}

impl From<Weekday> for u8 {
    fn from(day: Weekday) -> Self {
        day.number()
    }
}

impl TryFrom<u8> for Weekday {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=7 => Ok(Self::ALL[(value - 1) as usize]),
            other => Err(format!("weekday must be between 1 and 7, got {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionReminder {
    pub id: String,
    pub time: NaiveTime,
    pub is_enabled: bool,
}

/// One day's attempt. Entries are replaced, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub was_completed: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MissionValidationError {
    #[error("Mission name is required")]
    EmptyName,

    #[error("Mission name must be at most 100 characters")]
    NameTooLong,

    #[error("goalPerDay must be at least 1, got {0}")]
    NonPositiveGoal(i32),

    #[error("Daily missions need at least one weekday")]
    EmptyFrequency,

    #[error("Completion log has more than one entry for {0}")]
    DuplicateLogDay(NaiveDate),
}

impl Mission {
    /// Checks the record-level invariants, including one log entry per day.
    pub fn validate(&self, calendar: &Calendar) -> Result<(), MissionValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(MissionValidationError::EmptyName);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(MissionValidationError::NameTooLong);
        }
        if self.goal_per_day < 1 {
            return Err(MissionValidationError::NonPositiveGoal(self.goal_per_day));
        }
        if self.mission_type == MissionType::Daily && self.frequency.is_empty() {
            return Err(MissionValidationError::EmptyFrequency);
        }

        let mut seen = HashSet::with_capacity(self.completion_log.len());
        for entry in &self.completion_log {
            let day = calendar.day_of(entry.date);
            if !seen.insert(day) {
                return Err(MissionValidationError::DuplicateLogDay(day));
            }
        }

        Ok(())
    }

    /// Position and entry of the log record for `day`, if any.
    pub fn entry_on(&self, day: NaiveDate, calendar: &Calendar) -> Option<(usize, &CompletionEntry)> {
        self.completion_log
            .iter()
            .enumerate()
            .find(|(_, entry)| calendar.day_of(entry.date) == day)
    }

    pub fn is_completed_on(&self, day: NaiveDate, calendar: &Calendar) -> bool {
        self.entry_on(day, calendar)
            .map(|(_, entry)| entry.was_completed)
            .unwrap_or(false)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Short human description of the weekday selection.
    pub fn frequency_summary(&self) -> String {
        if self.mission_type == MissionType::Weekly {
            return "Once a week".into();
        }
        let mut days: Vec<Weekday> = self.frequency.clone();
        days.sort();
        days.dedup();
        match days.len() {
            0 => "None".into(),
            7 => "Every day".into(),
            1 => days[0].name().into(),
            n => format!("{} days / week", n),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekday_numbering_starts_on_sunday() {
        assert_eq!(Weekday::from(chrono::Weekday::Sun), Weekday::Sunday);
        assert_eq!(Weekday::from(chrono::Weekday::Wed).number(), 4);
        assert_eq!(Weekday::from(chrono::Weekday::Sat).number(), 7);
    }

    #[test]
    fn test_weekday_rejects_out_of_range() {
        assert!(serde_json::from_str::<Weekday>("0").is_err());
        assert!(serde_json::from_str::<Weekday>("8").is_err());
        assert_eq!(serde_json::from_str::<Weekday>("2").unwrap(), Weekday::Monday);
    }

    #[test]
    fn test_mission_serializes_with_stable_field_names() {
        let m = mission(MissionType::Daily, vec![Weekday::Monday, Weekday::Friday]);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["userId"], "pilot");
        assert_eq!(json["type"], "daily");
        assert_eq!(json["category"], "Physical Training");
        assert_eq!(json["frequency"], serde_json::json!([2, 6]));
        assert!(json.get("completionLog").is_some());
        assert!(json.get("goalPerDay").is_some());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut m = mission(MissionType::Daily, vec![Weekday::Monday]);
        m.name = "   ".into();
        assert_eq!(m.validate(&Calendar::utc()), Err(MissionValidationError::EmptyName));
    }

    #[test]
    fn test_validate_rejects_daily_without_weekdays() {
        let m = mission(MissionType::Daily, vec![]);
        assert_eq!(
            m.validate(&Calendar::utc()),
            Err(MissionValidationError::EmptyFrequency)
        );
    }

    #[test]
    fn test_validate_allows_weekly_without_weekdays() {
        let m = mission(MissionType::Weekly, vec![]);
        assert!(m.validate(&Calendar::utc()).is_ok());
    }

    #[test]
    fn test_validate_rejects_two_entries_on_one_day() {
        let mut m = mission(MissionType::Daily, vec![Weekday::Monday]);
        let mut second = entry(day(2026, 3, 4), false);
        second.id = "other".into();
        second.date = day(2026, 3, 4).and_hms_opt(20, 30, 0).unwrap().and_utc();
        m.completion_log = vec![entry(day(2026, 3, 4), true), second];
        assert_eq!(
            m.validate(&Calendar::utc()),
            Err(MissionValidationError::DuplicateLogDay(day(2026, 3, 4)))
        );
    }

    #[test]
    fn test_frequency_summary() {
        let mut m = mission(MissionType::Daily, Weekday::ALL.to_vec());
        assert_eq!(m.frequency_summary(), "Every day");
        m.frequency = vec![Weekday::Tuesday];
        assert_eq!(m.frequency_summary(), "Tuesday");
        m.frequency = vec![Weekday::Monday, Weekday::Wednesday, Weekday::Friday];
        assert_eq!(m.frequency_summary(), "3 days / week");
        m.mission_type = MissionType::Weekly;
        assert_eq!(m.frequency_summary(), "Once a week");
    }
}
