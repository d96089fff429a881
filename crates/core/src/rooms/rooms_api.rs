use async_trait::async_trait;
use chrono::NaiveDate;

use super::{Room, RoomId, RoomPatch, RoomScope};
use crate::errors::Result;

/// Backend operations a room view depends on.
#[async_trait]
pub trait RoomApi: Send + Sync {
    /// Lists rooms for a scope. Implementations normalise bare and wrapped payloads.
    async fn list_rooms(&self, scope: RoomScope) -> Result<Vec<Room>>;

    /// Sends a partial update for one room. The response body is not used.
    async fn update_room(&self, id: &RoomId, patch: &RoomPatch) -> Result<()>;

    /// Copies the dashboard rooms for `date` onto the housekeeping board.
    /// Returns the backend's message, if any.
    async fn import_to_housekeeping(&self, date: NaiveDate) -> Result<Option<String>>;
}
