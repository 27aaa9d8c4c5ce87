use std::{sync::Arc, time::Duration};

use log::info;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, Instant},
};

use crate::error::TimerError;

use super::{TimerPhase, TimerSnapshot, TimerState};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Everything the countdown reports to the outside world. `Completed` fires
/// exactly once per countdown, carrying the full planned duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Started { total_secs: u64 },
    Tick { remaining_secs: u64 },
    Paused { remaining_secs: u64 },
    Resumed { remaining_secs: u64 },
    Completed { elapsed_secs: u64 },
    Stopped { elapsed_secs: u64 },
}

/// Drives a [`TimerState`] with a once-per-second ticker task.
///
/// The ticker is the only autonomous writer; user actions and tick updates
/// serialize on the state mutex, so each update transforms the prior state
/// and nothing is lost to interleaving.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    events: broadcast::Sender<TimerEvent>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
}

impl TimerController {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            events,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.state.lock().await.snapshot(Instant::now())
    }

    /// Begin a countdown of `total_secs`. Starting while a countdown is
    /// already in progress is a no-op; a zero duration is rejected without
    /// touching the state.
    pub async fn start(&self, total_secs: u64) -> Result<(), TimerError> {
        self.start_with_elapsed(total_secs, 0).await
    }

    /// Begin a countdown with `elapsed_secs` already spent, as when resuming
    /// a session reconstructed from its persisted start time.
    pub async fn start_with_elapsed(
        &self,
        total_secs: u64,
        elapsed_secs: u64,
    ) -> Result<(), TimerError> {
        if total_secs == 0 {
            return Err(TimerError::InvalidDuration);
        }

        {
            let mut state = self.state.lock().await;
            if matches!(state.phase, TimerPhase::Running | TimerPhase::Paused) {
                return Ok(());
            }
            state.begin(total_secs * 1000, elapsed_secs * 1000, Instant::now());
        }

        self.spawn_ticker().await;
        self.emit(TimerEvent::Started { total_secs });
        Ok(())
    }

    /// No-op unless running.
    pub async fn pause(&self) {
        let remaining = {
            let mut state = self.state.lock().await;
            if state.phase != TimerPhase::Running {
                return;
            }
            let now = Instant::now();
            state.pause(now);
            state.remaining_secs(now)
        };
        self.emit(TimerEvent::Paused {
            remaining_secs: remaining,
        });
    }

    /// No-op unless paused.
    pub async fn resume(&self) {
        let remaining = {
            let mut state = self.state.lock().await;
            if state.phase != TimerPhase::Paused {
                return;
            }
            let now = Instant::now();
            state.resume(now);
            state.remaining_secs(now)
        };
        self.emit(TimerEvent::Resumed {
            remaining_secs: remaining,
        });
    }

    /// End the countdown early. Returns the elapsed whole seconds, or `None`
    /// when no countdown was in progress. The engine resets to idle.
    pub async fn stop(&self) -> Option<u64> {
        let elapsed = {
            let mut state = self.state.lock().await;
            if !matches!(state.phase, TimerPhase::Running | TimerPhase::Paused) {
                return None;
            }
            let elapsed = state.elapsed_secs(Instant::now());
            state.reset();
            elapsed
        };

        self.cancel_ticker().await;
        self.emit(TimerEvent::Stopped {
            elapsed_secs: elapsed,
        });
        Some(elapsed)
    }

    /// Stop the ticker without emitting anything. For view teardown.
    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let events = self.events.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            loop {
                interval.tick().await;

                let outcome = {
                    let mut guard = state.lock().await;
                    match guard.phase {
                        TimerPhase::Running => {
                            let remaining = guard.remaining_secs(Instant::now());
                            if remaining == 0 {
                                let total = guard.total_secs();
                                guard.finish();
                                TimerEvent::Completed {
                                    elapsed_secs: total,
                                }
                            } else {
                                TimerEvent::Tick {
                                    remaining_secs: remaining,
                                }
                            }
                        }
                        // Paused: keep the cadence but emit nothing.
                        TimerPhase::Paused => continue,
                        TimerPhase::Idle | TimerPhase::Completed => break,
                    }
                };

                let completed = matches!(outcome, TimerEvent::Completed { .. });
                let _ = events.send(outcome);
                if completed {
                    info!("Countdown finished; ticker halting until next start");
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    fn emit(&self, event: TimerEvent) {
        // A send error only means there are no subscribers right now.
        let _ = self.events.send(event);
    }
}

impl Default for TimerController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain_until_completed(
        rx: &mut broadcast::Receiver<TimerEvent>,
    ) -> (Vec<u64>, u64) {
        let mut remaining_seen = Vec::new();
        loop {
            match rx.recv().await.expect("event channel stays open") {
                TimerEvent::Tick { remaining_secs } => remaining_seen.push(remaining_secs),
                TimerEvent::Completed { elapsed_secs } => return (remaining_seen, elapsed_secs),
                _ => {}
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_completes_exactly_once() {
        let timer = TimerController::new();
        let mut rx = timer.subscribe();

        timer.start(3).await.unwrap();
        let (remaining_seen, elapsed) = drain_until_completed(&mut rx).await;

        assert_eq!(elapsed, 3);
        // Remaining is monotonically non-increasing while running.
        assert!(remaining_seen.windows(2).all(|w| w[1] <= w[0]));

        // No further events arrive without a new start.
        let after = time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(after.is_err(), "expected silence after completion");
        assert_eq!(timer.snapshot().await.time_remaining, 0);
    }

    #[tokio::test]
    async fn zero_duration_is_rejected() {
        let timer = TimerController::new();
        assert_eq!(timer.start(0).await, Err(TimerError::InvalidDuration));
        let snapshot = timer.snapshot().await;
        assert!(!snapshot.is_running);
        assert!(!snapshot.is_paused);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_running_is_a_no_op() {
        let timer = TimerController::new();
        timer.start(60).await.unwrap();
        timer.start(120).await.unwrap();

        assert_eq!(timer.snapshot().await.total_time, 60);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_then_resume_preserves_remaining() {
        let timer = TimerController::new();
        timer.start(60).await.unwrap();

        time::advance(Duration::from_secs(10)).await;
        timer.pause().await;
        let paused = timer.snapshot().await;
        assert!(paused.is_paused);
        assert_eq!(paused.time_remaining, 50);

        // Time passing while paused is not charged to the session.
        time::advance(Duration::from_secs(30)).await;
        timer.resume().await;
        assert_eq!(timer.snapshot().await.time_remaining, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_reports_elapsed_and_resets() {
        let timer = TimerController::new();
        timer.start(60).await.unwrap();

        time::advance(Duration::from_secs(25)).await;
        let elapsed = timer.stop().await;
        assert_eq!(elapsed, Some(25));

        let snapshot = timer.snapshot().await;
        assert!(!snapshot.is_running);
        assert_eq!(snapshot.total_time, 0);

        // Stopping again is a no-op.
        assert_eq!(timer.stop().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn reconstructed_countdown_finishes_early() {
        let timer = TimerController::new();
        let mut rx = timer.subscribe();

        // 25 minutes planned, 24 already elapsed before reconstruction.
        timer.start_with_elapsed(1500, 1440).await.unwrap();
        let (_, elapsed) = drain_until_completed(&mut rx).await;
        assert_eq!(elapsed, 1500);
    }
}
