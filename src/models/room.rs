//! Rows of the shared room tables.
//!
//! The remote store is the source of truth for all three; every local copy
//! is a cache refreshed by re-fetching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SessionCategory, SessionStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: SessionCategory,
    pub creator_id: String,
    pub max_participants: u32,
    pub is_active: bool,
    /// Shared background music, settable by any member.
    pub music_url: Option<String>,
    pub music_title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Derived from the participant table, not stored remotely.
    #[serde(default)]
    pub participant_count: u32,
}

/// Membership row. At most one active row exists per (room, user) pair;
/// `session_title`/`session_duration` advertise what the member is
/// currently working on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomParticipant {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub session_title: Option<String>,
    pub session_duration: Option<u32>,
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
}

/// A completed focus session inside a room. Append-only, never mutated
/// after insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSession {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub title: String,
    pub category: SessionCategory,
    pub duration: u32,
    pub actual_duration: u32,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}
