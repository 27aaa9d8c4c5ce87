use thiserror::Error;

/// Failure reported by the remote store layer.
///
/// The backend is an external collaborator, so its failures reach us as an
/// opaque message (network error, permission denial, room at capacity).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    /// `start` was called with a zero-length countdown. The engine state is
    /// left untouched.
    #[error("session duration must be greater than zero")]
    InvalidDuration,
}

#[derive(Debug, Error)]
pub enum RoomError {
    /// The room row does not exist; callers must leave the room view.
    #[error("room {0} not found")]
    NotFound(String),

    /// Pulling the room snapshot failed. Unrecoverable locally.
    #[error("failed to fetch room state")]
    Fetch(#[source] BackendError),

    /// The membership insert was rejected (e.g. the room is full).
    #[error("failed to join room")]
    Join(#[source] BackendError),

    /// Any other remote operation failure. Surfaced to the user as a
    /// retryable notification; no automatic retry is performed.
    #[error("room operation failed")]
    Backend(#[source] BackendError),

    #[error(transparent)]
    Timer(#[from] TimerError),
}
