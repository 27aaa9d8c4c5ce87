pub mod error;
pub mod models;
pub mod room;
pub mod session;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod utils;

pub use error::{BackendError, RoomError, TimerError};
pub use models::{Room, RoomParticipant, RoomSession, Session, SessionCategory, SessionStatus};
pub use room::{
    ChangeEvent, ChangeKind, MemoryBackend, RoomBackend, RoomController, RoomSnapshot,
    RoomSubscription,
};
pub use session::SessionController;
pub use stats::{session_stats, session_stats_at, SessionStats};
pub use storage::SessionStore;
pub use timer::{remaining_secs_since, TimerController, TimerEvent, TimerSnapshot};
pub use utils::format::{format_minutes, format_seconds};
