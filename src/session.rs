//! Solo session flow: one local current session at a time, driven by the
//! timer engine and finalized into the session history.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use log::{error, info};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    models::{Session, SessionCategory, SessionStatus},
    storage::SessionStore,
    timer::{remaining_secs_since, TimerController, TimerEvent, TimerSnapshot},
};

/// Owns the current-session pointer lifecycle: set on create, cleared when
/// the session is finalized by `stop` or by natural completion.
#[derive(Clone)]
pub struct SessionController {
    store: Arc<SessionStore>,
    timer: TimerController,
    completion_listener: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionController {
    pub fn new(store: Arc<SessionStore>, timer: TimerController) -> Self {
        let listener = spawn_completion_listener(store.clone(), timer.subscribe());
        Self {
            store,
            timer,
            completion_listener: Arc::new(Mutex::new(Some(listener))),
        }
    }

    pub fn timer(&self) -> &TimerController {
        &self.timer
    }

    /// Create a session in the paused state and make it current. The
    /// countdown does not run until [`play`](Self::play).
    pub fn create(
        &self,
        title: &str,
        category: SessionCategory,
        duration_minutes: u32,
    ) -> Result<Session> {
        let title = title.trim();
        if title.is_empty() {
            bail!("session title must not be empty");
        }
        if duration_minutes == 0 {
            bail!("session duration must be greater than zero");
        }
        if self.store.current().is_some() {
            bail!("a session is already in progress");
        }

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            category,
            duration: duration_minutes,
            actual_duration: None,
            status: SessionStatus::Paused,
            start_time: now,
            end_time: None,
            created_at: now,
        };
        self.store.set_current(Some(&session))?;
        Ok(session)
    }

    /// The persisted current session together with its remaining seconds,
    /// recomputed from the absolute start time so that time spent suspended
    /// is charged without replaying missed ticks.
    pub fn current_with_remaining(&self) -> Option<(Session, u64)> {
        let session = self.store.current()?;
        let remaining = remaining_secs_since(session.start_time, session.duration, Utc::now());
        Some((session, remaining))
    }

    /// Start or resume the countdown for the current session.
    pub async fn play(&self) -> Result<TimerSnapshot> {
        let session = self
            .store
            .current()
            .ok_or_else(|| anyhow!("no current session to play"))?;

        let snapshot = self.timer.snapshot().await;
        if snapshot.is_paused {
            self.timer.resume().await;
        } else if !snapshot.is_running {
            let total_secs = u64::from(session.duration) * 60;
            let remaining = remaining_secs_since(session.start_time, session.duration, Utc::now());
            self.timer
                .start_with_elapsed(total_secs, total_secs.saturating_sub(remaining))
                .await?;
        }

        Ok(self.timer.snapshot().await)
    }

    pub async fn pause(&self) {
        self.timer.pause().await;
    }

    /// Stop early: finalize as `stopped` with the minutes actually elapsed,
    /// append to history and clear the current pointer.
    pub async fn stop(&self) -> Result<Option<Session>> {
        let Some(mut session) = self.store.current() else {
            return Ok(None);
        };

        let elapsed_secs = self.timer.stop().await.unwrap_or(0);
        session.status = SessionStatus::Stopped;
        session.actual_duration = Some((elapsed_secs / 60) as u32);
        session.end_time = Some(Utc::now());

        self.store.save(&session)?;
        self.store.set_current(None)?;
        info!(
            "Stopped session {} after {} minute(s)",
            session.id,
            elapsed_secs / 60
        );
        Ok(Some(session))
    }

    pub async fn shutdown(&self) {
        self.timer.shutdown().await;
        if let Some(handle) = self.completion_listener.lock().await.take() {
            handle.abort();
        }
    }
}

fn spawn_completion_listener(
    store: Arc<SessionStore>,
    mut events: broadcast::Receiver<TimerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TimerEvent::Completed { .. }) => {
                    if let Err(err) = finalize_completed(&store) {
                        error!("Failed to finalize completed session: {err:#}");
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Natural completion credits the full planned duration, never the wall
/// clock of the final tick.
fn finalize_completed(store: &SessionStore) -> Result<()> {
    let Some(mut session) = store.current() else {
        return Ok(());
    };

    session.status = SessionStatus::Completed;
    session.actual_duration = Some(session.duration);
    session.end_time = Some(Utc::now());

    store.save(&session)?;
    store.set_current(None)?;
    info!("Session {} completed", session.id);
    Ok(())
}
