//! Keeps a local view of one room consistent with the remote store.
//!
//! Reconciliation is deliberately coarse: every change notification
//! invalidates the whole cached view and triggers a full re-fetch. The
//! remote store is authoritative, so a refetch racing a local mutation is
//! harmless; the last fetched snapshot always wins.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    error::{RoomError, TimerError},
    models::{Room, RoomParticipant, RoomSession, SessionCategory, SessionStatus},
    timer::TimerController,
};

use super::backend::{ChangeKind, RoomBackend, RoomTable};

/// How many completed sessions a room view shows.
pub const RECENT_SESSION_LIMIT: usize = 10;

const DEFAULT_MAX_PARTICIPANTS: u32 = 10;

/// One authoritative pull of a room's shared state.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub room: Room,
    pub participants: Vec<RoomParticipant>,
    pub recent_sessions: Vec<RoomSession>,
}

/// Handle on the two change feeds backing a room view. `shutdown` must be
/// called exactly once on teardown; dropping the handle without it leaves
/// the feed task running for the life of the process.
pub struct RoomSubscription {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RoomSubscription {
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!("Room feed task failed to join: {err}");
            }
        }
    }
}

#[derive(Clone)]
pub struct RoomController {
    backend: Arc<dyn RoomBackend>,
}

impl RoomController {
    pub fn new(backend: Arc<dyn RoomBackend>) -> Self {
        Self { backend }
    }

    /// Active rooms, newest first, with derived participant counts.
    pub async fn list_rooms(&self) -> Result<Vec<Room>, RoomError> {
        let mut rooms = self
            .backend
            .list_active_rooms()
            .await
            .map_err(RoomError::Fetch)?;
        for room in &mut rooms {
            let participants = self
                .backend
                .active_participants(&room.id)
                .await
                .map_err(RoomError::Fetch)?;
            room.participant_count = participants.len() as u32;
        }
        Ok(rooms)
    }

    pub async fn create_room(
        &self,
        name: &str,
        description: Option<String>,
        category: SessionCategory,
        creator_id: &str,
    ) -> Result<Room, RoomError> {
        let now = Utc::now();
        let room = Room {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description,
            category,
            creator_id: creator_id.to_string(),
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            is_active: true,
            music_url: None,
            music_title: None,
            created_at: now,
            updated_at: now,
            participant_count: 0,
        };
        self.backend
            .insert_room(room.clone())
            .await
            .map_err(RoomError::Backend)?;
        Ok(room)
    }

    /// Pull the authoritative state of one room. A missing room is
    /// unrecoverable for the caller (navigate away).
    pub async fn fetch_room_state(&self, room_id: &str) -> Result<RoomSnapshot, RoomError> {
        let mut room = self
            .backend
            .room(room_id)
            .await
            .map_err(RoomError::Fetch)?
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;

        let participants = self
            .backend
            .active_participants(room_id)
            .await
            .map_err(RoomError::Fetch)?;
        let recent_sessions = self
            .backend
            .recent_sessions(room_id, RECENT_SESSION_LIMIT)
            .await
            .map_err(RoomError::Fetch)?;

        room.participant_count = participants.len() as u32;
        Ok(RoomSnapshot {
            room,
            participants,
            recent_sessions,
        })
    }

    /// Watch a room: every participant change and every newly inserted room
    /// session triggers a full re-pull, published on the returned watch
    /// channel (latest snapshot wins).
    pub async fn subscribe(
        &self,
        room_id: &str,
    ) -> Result<(RoomSubscription, watch::Receiver<RoomSnapshot>), RoomError> {
        let initial = self.fetch_room_state(room_id).await?;
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let controller = self.clone();
        let room_id = room_id.to_string();
        let mut participant_changes = self.backend.changes(RoomTable::Participants);
        let mut session_changes = self.backend.changes(RoomTable::Sessions);

        let handle = tokio::spawn(async move {
            loop {
                let relevant = tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    event = participant_changes.recv() => match event {
                        Ok(event) => event_touches_room(&event.room_id, &room_id),
                        // Dropped notifications still invalidate the cache.
                        Err(broadcast::error::RecvError::Lagged(_)) => true,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    event = session_changes.recv() => match event {
                        Ok(event) => {
                            event.kind == ChangeKind::Insert
                                && event_touches_room(&event.room_id, &room_id)
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => true,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                };

                if !relevant {
                    continue;
                }

                match controller.fetch_room_state(&room_id).await {
                    Ok(snapshot) => {
                        let _ = snapshot_tx.send(snapshot);
                    }
                    // Single attempt per notification; the next change will
                    // trigger another pull.
                    Err(err) => warn!("Room {room_id} refetch failed: {err}"),
                }
            }
        });

        Ok((
            RoomSubscription {
                cancel,
                handle: Some(handle),
            },
            snapshot_rx,
        ))
    }

    /// Change the room's shared music for everyone. The room view does not
    /// watch the rooms feed, so members pick the change up on their next
    /// pull; the rooms list page converges immediately.
    pub async fn update_music(
        &self,
        room_id: &str,
        music_url: &str,
        music_title: &str,
    ) -> Result<(), RoomError> {
        self.backend
            .update_room_music(room_id, music_url.to_string(), music_title.to_string())
            .await
            .map_err(RoomError::Backend)
    }

    /// Join a room. Already being an active member is a no-op, so a double
    /// join leaves exactly one active row.
    pub async fn join(&self, room_id: &str, user_id: &str) -> Result<(), RoomError> {
        let existing = self
            .backend
            .find_active_participant(room_id, user_id)
            .await
            .map_err(RoomError::Join)?;
        if existing.is_some() {
            return Ok(());
        }

        let participant = RoomParticipant {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            session_title: None,
            session_duration: None,
            is_active: true,
            joined_at: Utc::now(),
        };
        self.backend
            .insert_participant(participant)
            .await
            .map_err(RoomError::Join)?;
        info!("User {user_id} joined room {room_id}");
        Ok(())
    }

    /// Leave a room. Absent membership is a no-op.
    pub async fn leave(&self, room_id: &str, user_id: &str) -> Result<(), RoomError> {
        self.backend
            .remove_participant(room_id, user_id)
            .await
            .map_err(RoomError::Backend)
    }

    /// Advertise what the member is working on and hand a fresh countdown to
    /// the timer engine. No session row is created yet; that happens on
    /// completion.
    pub async fn start_focus(
        &self,
        room_id: &str,
        user_id: &str,
        title: &str,
        duration_minutes: u32,
        timer: &TimerController,
    ) -> Result<(), RoomError> {
        if duration_minutes == 0 {
            // Reject before annotating so no state changes on bad input.
            return Err(TimerError::InvalidDuration.into());
        }

        self.backend
            .update_participant_focus(
                room_id,
                user_id,
                Some(title.to_string()),
                Some(duration_minutes),
            )
            .await
            .map_err(RoomError::Backend)?;

        timer.start(u64::from(duration_minutes) * 60).await?;
        Ok(())
    }

    /// Record a finished room session, then clear the member's annotation.
    ///
    /// The two writes are independent; if the insert lands but the clear
    /// fails, the member keeps a stale "still working" badge until a later
    /// update. The inserted row is authoritative either way.
    pub async fn complete_focus(
        &self,
        room_id: &str,
        user_id: &str,
        title: &str,
        category: SessionCategory,
        duration_minutes: u32,
    ) -> Result<RoomSession, RoomError> {
        let session = RoomSession {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            category,
            duration: duration_minutes,
            actual_duration: duration_minutes,
            status: SessionStatus::Completed,
            created_at: Utc::now(),
        };
        self.backend
            .insert_room_session(session.clone())
            .await
            .map_err(RoomError::Backend)?;

        if let Err(err) = self
            .backend
            .update_participant_focus(room_id, user_id, None, None)
            .await
        {
            warn!(
                "Session {} saved but the working badge of {user_id} was not cleared: {err}",
                session.id
            );
        }

        Ok(session)
    }
}

fn event_touches_room(event_room: &Option<String>, room_id: &str) -> bool {
    match event_room {
        Some(id) => id == room_id,
        // Events without room attribution invalidate conservatively.
        None => true,
    }
}
