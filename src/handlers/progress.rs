use axum::{extract::State, Extension, Json};
use chrono::Utc;

use crate::auth::middleware::AuthUser;
use crate::dto::{MissionWithStatus, ProgressResponse};
use crate::error::AppResult;
use crate::AppState;

/// Dashboard numbers: overall streak, planets discovered and today's fuel.
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ProgressResponse>> {
    let now = Utc::now();
    let calendar = *state.missions.calendar();
    let today = calendar.day_of(now);

    let snapshot = state.missions.progress(&auth_user.id, now).await?;

    Ok(Json(ProgressResponse {
        stats: snapshot.stats,
        completed_today: snapshot.completed_today,
        todays_missions: snapshot
            .todays_missions
            .into_iter()
            .map(|m| MissionWithStatus::new(m, today, &calendar))
            .collect(),
    }))
}
