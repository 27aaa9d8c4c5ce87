pub mod controller;
pub mod state;

pub use controller::{TimerController, TimerEvent};
pub use state::{remaining_secs_since, TimerPhase, TimerSnapshot, TimerState};
