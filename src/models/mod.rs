pub mod room;
pub mod session;

pub use room::{Room, RoomParticipant, RoomSession};
pub use session::{Session, SessionCategory, SessionStatus};
