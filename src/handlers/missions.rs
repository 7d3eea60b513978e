use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{
    CreateMissionRequest, DeleteResponse, ListMissionsQuery, MissionWithStatus, ToggleAction,
    ToggleResponse, UpdateMissionRequest,
};
use crate::error::AppResult;
use crate::AppState;

pub async fn list_missions(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ListMissionsQuery>,
) -> AppResult<Json<Vec<MissionWithStatus>>> {
    let now = Utc::now();
    let calendar = *state.missions.calendar();
    let today = calendar.day_of(now);

    let missions = state.missions.list(&auth_user.id, query.status, now).await?;
    let result = missions
        .into_iter()
        .map(|m| MissionWithStatus::new(m, today, &calendar))
        .collect();

    Ok(Json(result))
}

pub async fn todays_missions(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<MissionWithStatus>>> {
    let now = Utc::now();
    let calendar = *state.missions.calendar();
    let today = calendar.day_of(now);

    let missions = state.missions.todays_missions(&auth_user.id, now).await?;
    let result = missions
        .into_iter()
        .map(|m| MissionWithStatus::new(m, today, &calendar))
        .collect();

    Ok(Json(result))
}

pub async fn get_mission(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(mission_id): Path<String>,
) -> AppResult<Json<MissionWithStatus>> {
    let mission = state
        .missions
        .get(&auth_user.id, &mission_id, Utc::now())
        .await?;
    Ok(Json(with_status(&state, mission)))
}

pub async fn create_mission(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateMissionRequest>,
) -> AppResult<Json<MissionWithStatus>> {
    body.validate()?;

    let mission = state
        .missions
        .create(&auth_user.id, body, Utc::now())
        .await?;

    broadcast_change(&state, &auth_user.id, &mission.id);
    Ok(Json(with_status(&state, mission)))
}

pub async fn update_mission(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(mission_id): Path<String>,
    Json(body): Json<UpdateMissionRequest>,
) -> AppResult<Json<MissionWithStatus>> {
    body.validate()?;

    let mission = state
        .missions
        .update(&auth_user.id, &mission_id, body)
        .await?;

    broadcast_change(&state, &auth_user.id, &mission.id);
    Ok(Json(with_status(&state, mission)))
}

pub async fn delete_mission(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(mission_id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    state.missions.delete(&auth_user.id, &mission_id).await?;

    broadcast_change(&state, &auth_user.id, &mission_id);
    Ok(Json(DeleteResponse {
        deleted: true,
        id: mission_id,
    }))
}

pub async fn toggle_mission(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(mission_id): Path<String>,
) -> AppResult<Json<ToggleResponse>> {
    let now = Utc::now();
    let calendar = *state.missions.calendar();

    let mission = state
        .missions
        .toggle_completion(&auth_user.id, &mission_id, now)
        .await?;

    let today = calendar.day_of(now);
    let action = if mission.is_completed_on(today, &calendar) {
        ToggleAction::Completed
    } else {
        ToggleAction::Uncompleted
    };

    broadcast_change(&state, &auth_user.id, &mission.id);
    Ok(Json(ToggleResponse {
        action,
        mission: MissionWithStatus::new(mission, today, &calendar),
    }))
}

pub async fn activate_mission(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(mission_id): Path<String>,
) -> AppResult<Json<MissionWithStatus>> {
    set_active(state, auth_user, mission_id, true).await
}

pub async fn pause_mission(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(mission_id): Path<String>,
) -> AppResult<Json<MissionWithStatus>> {
    set_active(state, auth_user, mission_id, false).await
}

async fn set_active(
    state: AppState,
    auth_user: AuthUser,
    mission_id: String,
    active: bool,
) -> AppResult<Json<MissionWithStatus>> {
    let mission = state
        .missions
        .set_active(&auth_user.id, &mission_id, active)
        .await?;

    broadcast_change(&state, &auth_user.id, &mission.id);
    Ok(Json(with_status(&state, mission)))
}

fn with_status(state: &AppState, mission: crate::models::mission::Mission) -> MissionWithStatus {
    let calendar = state.missions.calendar();
    MissionWithStatus::new(mission, calendar.day_of(Utc::now()), calendar)
}

/// Lets other open clients of the same user refetch.
fn broadcast_change(state: &AppState, user_id: &str, mission_id: &str) {
    if let Some(tx) = state.ws_tx.as_ref() {
        let msg = serde_json::json!({
            "type": "missions_changed",
            "user_id": user_id,
            "mission_id": mission_id,
        });
        let _ = tx.send(msg.to_string());
    }
}
