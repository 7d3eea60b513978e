use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use super::{MissionStore, StoreError, StoreResult};
use crate::models::mission::{
    CompletionEntry, Mission, MissionCategory, MissionReminder, MissionType, Weekday,
};

#[derive(Clone)]
pub struct PgMissionStore {
    db: PgPool,
}

impl PgMissionStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct MissionRow {
    id: String,
    user_id: String,
    name: String,
    category: MissionCategory,
    mission_type: MissionType,
    start_date: NaiveDate,
    frequency: Json<Vec<Weekday>>,
    goal_per_day: i32,
    preferred_time_of_day: Option<NaiveTime>,
    is_active: bool,
    reminders: Json<Vec<MissionReminder>>,
    current_streak: i32,
    best_streak: i32,
    total_completions: i32,
    missed_days: i32,
    last_completed: Option<DateTime<Utc>>,
    completion_log: Json<Vec<CompletionEntry>>,
    version: i64,
}

impl From<MissionRow> for Mission {
    fn from(row: MissionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            category: row.category,
            mission_type: row.mission_type,
            start_date: row.start_date,
            frequency: row.frequency.0,
            goal_per_day: row.goal_per_day,
            preferred_time_of_day: row.preferred_time_of_day,
            is_active: row.is_active,
            reminders: row.reminders.0,
            current_streak: row.current_streak,
            best_streak: row.best_streak,
            total_completions: row.total_completions,
            missed_days: row.missed_days,
            last_completed: row.last_completed,
            completion_log: row.completion_log.0,
            version: row.version,
        }
    }
}

const MISSION_COLUMNS: &str = r#"
    id, user_id, name, category, mission_type, start_date, frequency, goal_per_day,
    preferred_time_of_day, is_active, reminders, current_streak, best_streak,
    total_completions, missed_days, last_completed, completion_log, version
"#;

/// JSONB columns that fail to decode are a bad payload, not an outage.
fn map_sqlx(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Malformed(err.to_string())
        }
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl MissionStore for PgMissionStore {
    async fn fetch_missions(&self, user_id: &str) -> StoreResult<Vec<Mission>> {
        let rows = sqlx::query_as::<_, MissionRow>(&format!(
            "SELECT {} FROM missions WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
            MISSION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(map_sqlx)?;

        Ok(rows.into_iter().map(Mission::from).collect())
    }

    async fn fetch_mission(&self, id: &str) -> StoreResult<Option<Mission>> {
        let row = sqlx::query_as::<_, MissionRow>(&format!(
            "SELECT {} FROM missions WHERE id = $1",
            MISSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx)?;

        Ok(row.map(Mission::from))
    }

    async fn create_mission(&self, mission: &Mission) -> StoreResult<String> {
        let id = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO missions (
                id, user_id, name, category, mission_type, start_date, frequency, goal_per_day,
                preferred_time_of_day, is_active, reminders, current_streak, best_streak,
                total_completions, missed_days, last_completed, completion_log, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, 0)
            RETURNING id
            "#,
        )
        .bind(&mission.id)
        .bind(&mission.user_id)
        .bind(&mission.name)
        .bind(mission.category)
        .bind(mission.mission_type)
        .bind(mission.start_date)
        .bind(Json(&mission.frequency))
        .bind(mission.goal_per_day)
        .bind(mission.preferred_time_of_day)
        .bind(mission.is_active)
        .bind(Json(&mission.reminders))
        .bind(mission.current_streak)
        .bind(mission.best_streak)
        .bind(mission.total_completions)
        .bind(mission.missed_days)
        .bind(mission.last_completed)
        .bind(Json(&mission.completion_log))
        .fetch_one(&self.db)
        .await
        .map_err(map_sqlx)?;

        Ok(id)
    }

    async fn update_mission(&self, mission: &Mission) -> StoreResult<Mission> {
        // user_id and category are immutable and deliberately absent from SET.
        let row = sqlx::query_as::<_, MissionRow>(&format!(
            r#"
            UPDATE missions SET
                name = $3,
                mission_type = $4,
                start_date = $5,
                frequency = $6,
                goal_per_day = $7,
                preferred_time_of_day = $8,
                is_active = $9,
                reminders = $10,
                current_streak = $11,
                best_streak = $12,
                total_completions = $13,
                missed_days = $14,
                last_completed = $15,
                completion_log = $16,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING {}
            "#,
            MISSION_COLUMNS
        ))
        .bind(&mission.id)
        .bind(mission.version)
        .bind(&mission.name)
        .bind(mission.mission_type)
        .bind(mission.start_date)
        .bind(Json(&mission.frequency))
        .bind(mission.goal_per_day)
        .bind(mission.preferred_time_of_day)
        .bind(mission.is_active)
        .bind(Json(&mission.reminders))
        .bind(mission.current_streak)
        .bind(mission.best_streak)
        .bind(mission.total_completions)
        .bind(mission.missed_days)
        .bind(mission.last_completed)
        .bind(Json(&mission.completion_log))
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx)?;

        if let Some(row) = row {
            return Ok(row.into());
        }

        // Nothing matched: either the row is gone or someone else wrote first.
        let exists = sqlx::query_scalar::<_, i64>("SELECT version FROM missions WHERE id = $1")
            .bind(&mission.id)
            .fetch_optional(&self.db)
            .await
            .map_err(map_sqlx)?;

        match exists {
            Some(_) => Err(StoreError::Conflict {
                id: mission.id.clone(),
                expected: mission.version,
            }),
            None => Err(StoreError::NotFound(mission.id.clone())),
        }
    }

    async fn delete_mission(&self, id: &str, requesting_user_id: &str) -> StoreResult<()> {
        let owner = sqlx::query_scalar::<_, String>("SELECT user_id FROM missions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if owner != requesting_user_id {
            return Err(StoreError::PermissionDenied(id.to_string()));
        }

        let result = sqlx::query("DELETE FROM missions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(requesting_user_id)
            .execute(&self.db)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.db).await?;
        Ok(())
    }
}
