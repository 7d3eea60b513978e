use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{MissionStore, StoreError, StoreResult};
use crate::models::mission::Mission;

/// Process-local store for development and tests.
/// Same version semantics as the Postgres store.
#[derive(Clone, Default)]
pub struct MemoryMissionStore {
    missions: Arc<Mutex<Vec<Mission>>>,
}

impl MemoryMissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MissionStore for MemoryMissionStore {
    async fn fetch_missions(&self, user_id: &str) -> StoreResult<Vec<Mission>> {
        let missions = self.missions.lock().await;
        Ok(missions
            .iter()
            .filter(|m| m.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    async fn fetch_mission(&self, id: &str) -> StoreResult<Option<Mission>> {
        let missions = self.missions.lock().await;
        Ok(missions.iter().find(|m| m.id == id).cloned())
    }

    async fn create_mission(&self, mission: &Mission) -> StoreResult<String> {
        let mut missions = self.missions.lock().await;
        if missions.iter().any(|m| m.id == mission.id) {
            return Err(StoreError::Conflict {
                id: mission.id.clone(),
                expected: 0,
            });
        }
        let mut stored = mission.clone();
        stored.version = 0;
        missions.push(stored);
        Ok(mission.id.clone())
    }

    async fn update_mission(&self, mission: &Mission) -> StoreResult<Mission> {
        let mut missions = self.missions.lock().await;
        let slot = missions
            .iter_mut()
            .find(|m| m.id == mission.id)
            .ok_or_else(|| StoreError::NotFound(mission.id.clone()))?;

        if slot.version != mission.version {
            return Err(StoreError::Conflict {
                id: mission.id.clone(),
                expected: mission.version,
            });
        }

        let mut stored = mission.clone();
        stored.version = mission.version + 1;
        *slot = stored.clone();
        Ok(stored)
    }

    async fn delete_mission(&self, id: &str, requesting_user_id: &str) -> StoreResult<()> {
        let mut missions = self.missions.lock().await;
        let index = missions
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !missions[index].is_owned_by(requesting_user_id) {
            return Err(StoreError::PermissionDenied(id.to_string()));
        }

        missions.remove(index);
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
