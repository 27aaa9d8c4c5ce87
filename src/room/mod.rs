pub mod backend;
pub mod controller;
pub mod memory;

pub use backend::{ChangeEvent, ChangeKind, RoomBackend, RoomTable};
pub use controller::{RoomController, RoomSnapshot, RoomSubscription, RECENT_SESSION_LIMIT};
pub use memory::MemoryBackend;
