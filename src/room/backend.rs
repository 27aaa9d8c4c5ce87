//! Contract with the remote store that owns the shared room tables.
//!
//! The store exposes three logical tables (`rooms`, `room_participants`,
//! `room_sessions`) and a change feed per table. Feed receivers observe
//! every change on their table, tagged with the affected room; callers
//! filter down to the room they care about.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::BackendError;
use crate::models::{Room, RoomParticipant, RoomSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomTable {
    Rooms,
    Participants,
    Sessions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A change notification. Carries no row data: consumers re-fetch the
/// authoritative state instead of merging deltas.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub table: RoomTable,
    pub kind: ChangeKind,
    pub room_id: Option<String>,
}

#[async_trait]
pub trait RoomBackend: Send + Sync {
    /// Active rooms, newest first.
    async fn list_active_rooms(&self) -> Result<Vec<Room>, BackendError>;

    async fn insert_room(&self, room: Room) -> Result<(), BackendError>;

    /// Patch the shared music of a room.
    async fn update_room_music(
        &self,
        room_id: &str,
        music_url: String,
        music_title: String,
    ) -> Result<(), BackendError>;

    async fn room(&self, room_id: &str) -> Result<Option<Room>, BackendError>;

    async fn active_participants(
        &self,
        room_id: &str,
    ) -> Result<Vec<RoomParticipant>, BackendError>;

    async fn find_active_participant(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<Option<RoomParticipant>, BackendError>;

    /// Insert a membership row. The store enforces the room capacity and the
    /// one-active-row-per-(room, user) invariant.
    async fn insert_participant(&self, participant: RoomParticipant) -> Result<(), BackendError>;

    /// Set or clear the "currently working on" annotation of a member.
    async fn update_participant_focus(
        &self,
        room_id: &str,
        user_id: &str,
        session_title: Option<String>,
        session_duration: Option<u32>,
    ) -> Result<(), BackendError>;

    /// Remove the active membership row. Absent rows are a no-op.
    async fn remove_participant(&self, room_id: &str, user_id: &str) -> Result<(), BackendError>;

    /// Completed room sessions, newest first, at most `limit`.
    async fn recent_sessions(
        &self,
        room_id: &str,
        limit: usize,
    ) -> Result<Vec<RoomSession>, BackendError>;

    /// Append a completed session row. Rows are never mutated afterwards.
    async fn insert_room_session(&self, session: RoomSession) -> Result<(), BackendError>;

    /// Open a change feed on one table.
    fn changes(&self, table: RoomTable) -> broadcast::Receiver<ChangeEvent>;
}
