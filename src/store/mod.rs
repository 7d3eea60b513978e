//! Mission persistence boundary.
//!
//! Every write carries the full mission record. Updates are conditional on
//! the record's `version`, which closes the read-modify-write race of the
//! toggle path: a writer holding a stale snapshot gets [`StoreError::Conflict`]
//! instead of silently overwriting a concurrent change.

use async_trait::async_trait;

use crate::models::mission::Mission;

pub mod memory;
pub mod postgres;

pub use memory::MemoryMissionStore;
pub use postgres::PgMissionStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Mission not found: {0}")]
    NotFound(String),

    #[error("Mission {0} belongs to another user")]
    PermissionDenied(String),

    #[error("Mission {id} changed since version {expected}")]
    Conflict { id: String, expected: i64 },

    #[error("Malformed mission record: {0}")]
    Malformed(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait MissionStore: Send + Sync {
    /// All missions owned by `user_id`, oldest first.
    async fn fetch_missions(&self, user_id: &str) -> StoreResult<Vec<Mission>>;

    async fn fetch_mission(&self, id: &str) -> StoreResult<Option<Mission>>;

    /// Insert a new record and return its id. The stored version starts at 0.
    async fn create_mission(&self, mission: &Mission) -> StoreResult<String>;

    /// Replace the stored record if its version still equals `mission.version`.
    /// Returns the record as stored, with the version bumped.
    async fn update_mission(&self, mission: &Mission) -> StoreResult<Mission>;

    /// Remove a mission after checking it belongs to `requesting_user_id`.
    async fn delete_mission(&self, id: &str, requesting_user_id: &str) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;
}
