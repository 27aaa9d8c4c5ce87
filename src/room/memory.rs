//! In-process [`RoomBackend`] for tests and local development.
//!
//! Tables are plain vectors behind one mutex; change feeds are broadcast
//! channels fanned out per table. Capacity and membership invariants are
//! enforced here, mirroring what the production store does server-side.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, Mutex};

use crate::error::BackendError;
use crate::models::{Room, RoomParticipant, RoomSession};

use super::backend::{ChangeEvent, ChangeKind, RoomBackend, RoomTable};

const FEED_CAPACITY: usize = 256;

#[derive(Default)]
struct Tables {
    rooms: Vec<Room>,
    participants: Vec<RoomParticipant>,
    sessions: Vec<RoomSession>,
}

pub struct MemoryBackend {
    tables: Mutex<Tables>,
    rooms_feed: broadcast::Sender<ChangeEvent>,
    participants_feed: broadcast::Sender<ChangeEvent>,
    sessions_feed: broadcast::Sender<ChangeEvent>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (rooms_feed, _) = broadcast::channel(FEED_CAPACITY);
        let (participants_feed, _) = broadcast::channel(FEED_CAPACITY);
        let (sessions_feed, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            tables: Mutex::new(Tables::default()),
            rooms_feed,
            participants_feed,
            sessions_feed,
        }
    }

    fn notify(&self, table: RoomTable, kind: ChangeKind, room_id: Option<&str>) {
        let event = ChangeEvent {
            table,
            kind,
            room_id: room_id.map(str::to_string),
        };
        let feed = match table {
            RoomTable::Rooms => &self.rooms_feed,
            RoomTable::Participants => &self.participants_feed,
            RoomTable::Sessions => &self.sessions_feed,
        };
        // A send error only means nobody is listening on this table.
        let _ = feed.send(event);
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomBackend for MemoryBackend {
    async fn list_active_rooms(&self) -> Result<Vec<Room>, BackendError> {
        let tables = self.tables.lock().await;
        let mut rooms: Vec<Room> = tables
            .rooms
            .iter()
            .filter(|room| room.is_active)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rooms)
    }

    async fn insert_room(&self, room: Room) -> Result<(), BackendError> {
        let room_id = room.id.clone();
        self.tables.lock().await.rooms.push(room);
        self.notify(RoomTable::Rooms, ChangeKind::Insert, Some(&room_id));
        Ok(())
    }

    async fn update_room_music(
        &self,
        room_id: &str,
        music_url: String,
        music_title: String,
    ) -> Result<(), BackendError> {
        {
            let mut tables = self.tables.lock().await;
            let room = tables
                .rooms
                .iter_mut()
                .find(|room| room.id == room_id)
                .ok_or_else(|| BackendError::new("room does not exist"))?;
            room.music_url = Some(music_url);
            room.music_title = Some(music_title);
            room.updated_at = Utc::now();
        }
        self.notify(RoomTable::Rooms, ChangeKind::Update, Some(room_id));
        Ok(())
    }

    async fn room(&self, room_id: &str) -> Result<Option<Room>, BackendError> {
        let tables = self.tables.lock().await;
        Ok(tables.rooms.iter().find(|room| room.id == room_id).cloned())
    }

    async fn active_participants(
        &self,
        room_id: &str,
    ) -> Result<Vec<RoomParticipant>, BackendError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .participants
            .iter()
            .filter(|p| p.room_id == room_id && p.is_active)
            .cloned()
            .collect())
    }

    async fn find_active_participant(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> Result<Option<RoomParticipant>, BackendError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .participants
            .iter()
            .find(|p| p.room_id == room_id && p.user_id == user_id && p.is_active)
            .cloned())
    }

    async fn insert_participant(&self, participant: RoomParticipant) -> Result<(), BackendError> {
        let room_id = participant.room_id.clone();
        {
            let mut tables = self.tables.lock().await;

            let room = tables
                .rooms
                .iter()
                .find(|room| room.id == participant.room_id)
                .ok_or_else(|| BackendError::new("room does not exist"))?;
            let capacity = room.max_participants as usize;

            // One active row per (room, user): a duplicate insert is absorbed.
            if tables
                .participants
                .iter()
                .any(|p| p.room_id == participant.room_id && p.user_id == participant.user_id && p.is_active)
            {
                return Ok(());
            }

            let occupancy = tables
                .participants
                .iter()
                .filter(|p| p.room_id == participant.room_id && p.is_active)
                .count();
            if occupancy >= capacity {
                return Err(BackendError::new("room is full"));
            }

            tables.participants.push(participant);
        }
        self.notify(RoomTable::Participants, ChangeKind::Insert, Some(&room_id));
        Ok(())
    }

    async fn update_participant_focus(
        &self,
        room_id: &str,
        user_id: &str,
        session_title: Option<String>,
        session_duration: Option<u32>,
    ) -> Result<(), BackendError> {
        let updated = {
            let mut tables = self.tables.lock().await;
            match tables
                .participants
                .iter_mut()
                .find(|p| p.room_id == room_id && p.user_id == user_id && p.is_active)
            {
                Some(participant) => {
                    participant.session_title = session_title;
                    participant.session_duration = session_duration;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.notify(RoomTable::Participants, ChangeKind::Update, Some(room_id));
        }
        Ok(())
    }

    async fn remove_participant(&self, room_id: &str, user_id: &str) -> Result<(), BackendError> {
        let removed = {
            let mut tables = self.tables.lock().await;
            let before = tables.participants.len();
            tables
                .participants
                .retain(|p| !(p.room_id == room_id && p.user_id == user_id && p.is_active));
            tables.participants.len() != before
        };
        if removed {
            self.notify(RoomTable::Participants, ChangeKind::Delete, Some(room_id));
        }
        Ok(())
    }

    async fn recent_sessions(
        &self,
        room_id: &str,
        limit: usize,
    ) -> Result<Vec<RoomSession>, BackendError> {
        let tables = self.tables.lock().await;
        let mut sessions: Vec<RoomSession> = tables
            .sessions
            .iter()
            .filter(|session| session.room_id == room_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn insert_room_session(&self, session: RoomSession) -> Result<(), BackendError> {
        let room_id = session.room_id.clone();
        self.tables.lock().await.sessions.push(session);
        self.notify(RoomTable::Sessions, ChangeKind::Insert, Some(&room_id));
        Ok(())
    }

    fn changes(&self, table: RoomTable) -> broadcast::Receiver<ChangeEvent> {
        match table {
            RoomTable::Rooms => self.rooms_feed.subscribe(),
            RoomTable::Participants => self.participants_feed.subscribe(),
            RoomTable::Sessions => self.sessions_feed.subscribe(),
        }
    }
}
