use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum SessionCategory {
    Study,
    Work,
    Fitness,
    Custom,
}

impl SessionCategory {
    pub const ALL: [SessionCategory; 4] = [
        SessionCategory::Study,
        SessionCategory::Work,
        SessionCategory::Fitness,
        SessionCategory::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionCategory::Study => "Study",
            SessionCategory::Work => "Work",
            SessionCategory::Fitness => "Fitness",
            SessionCategory::Custom => "Custom",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Completed,
    Paused,
    Stopped,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Completed => "completed",
            SessionStatus::Paused => "paused",
            SessionStatus::Stopped => "stopped",
        }
    }
}

/// One focus interval. `duration` is the planned length in minutes;
/// `actual_duration` is filled in when the session is finalized. A completed
/// session always records the full planned duration, a stopped one records
/// the minutes actually elapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    pub category: SessionCategory,
    pub duration: u32,
    pub actual_duration: Option<u32>,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
