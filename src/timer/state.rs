use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Completed,
}

impl Default for TimerPhase {
    fn default() -> Self {
        TimerPhase::Idle
    }
}

/// Countdown state. Elapsed time is derived from an absolute anchor instant
/// rather than accumulated ticks, so a late or missed tick never drifts the
/// countdown: `elapsed = baseline + (now − anchor)`.
#[derive(Debug, Clone)]
pub struct TimerState {
    pub phase: TimerPhase,
    pub total_ms: u64,
    /// Elapsed time frozen at the last pause/stop.
    active_ms: u64,
    /// Elapsed time accumulated from earlier running windows; combines with
    /// `running_anchor` to compute the true elapsed duration.
    active_ms_baseline: u64,
    running_anchor: Option<Instant>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            phase: TimerPhase::Idle,
            total_ms: 0,
            active_ms: 0,
            active_ms_baseline: 0,
            running_anchor: None,
        }
    }
}

/// Public view of the countdown, in the shape consumers display: exactly one
/// of idle / running / paused / completed holds at any instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub is_running: bool,
    pub is_paused: bool,
    pub time_remaining: u64,
    pub total_time: u64,
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh countdown, optionally with time already elapsed (used
    /// when reconstructing a persisted session).
    pub fn begin(&mut self, total_ms: u64, elapsed_ms: u64, now: Instant) {
        *self = Self {
            phase: TimerPhase::Running,
            total_ms,
            active_ms: elapsed_ms.min(total_ms),
            active_ms_baseline: elapsed_ms.min(total_ms),
            running_anchor: Some(now),
        };
    }

    pub fn pause(&mut self, now: Instant) {
        if self.phase != TimerPhase::Running {
            return;
        }
        self.active_ms = self.current_active_ms(now);
        self.active_ms_baseline = self.active_ms;
        self.running_anchor = None;
        self.phase = TimerPhase::Paused;
    }

    pub fn resume(&mut self, now: Instant) {
        if self.phase != TimerPhase::Paused {
            return;
        }
        self.running_anchor = Some(now);
        self.phase = TimerPhase::Running;
    }

    /// Natural completion: the countdown reached zero. Elapsed time is
    /// credited as the full planned duration.
    pub fn finish(&mut self) {
        self.phase = TimerPhase::Completed;
        self.active_ms = self.total_ms;
        self.active_ms_baseline = self.total_ms;
        self.running_anchor = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn current_active_ms(&self, now: Instant) -> u64 {
        match (self.phase, self.running_anchor) {
            (TimerPhase::Running, Some(anchor)) => {
                let since_anchor = now.saturating_duration_since(anchor).as_millis() as u64;
                self.active_ms_baseline
                    .saturating_add(since_anchor)
                    .min(self.total_ms)
            }
            _ => self.active_ms,
        }
    }

    pub fn remaining_secs(&self, now: Instant) -> u64 {
        let remaining_ms = self.total_ms.saturating_sub(self.current_active_ms(now));
        remaining_ms / 1000
    }

    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        self.current_active_ms(now) / 1000
    }

    pub fn total_secs(&self) -> u64 {
        self.total_ms / 1000
    }

    pub fn snapshot(&self, now: Instant) -> TimerSnapshot {
        TimerSnapshot {
            is_running: self.phase == TimerPhase::Running,
            is_paused: self.phase == TimerPhase::Paused,
            time_remaining: self.remaining_secs(now),
            total_time: self.total_secs(),
        }
    }
}

/// Remaining seconds of a persisted session, recomputed from its absolute
/// start time so that time spent suspended (app closed, machine asleep) is
/// accounted for without replaying missed ticks.
pub fn remaining_secs_since(
    start_time: DateTime<Utc>,
    planned_minutes: u32,
    now: DateTime<Utc>,
) -> u64 {
    let planned_secs = i64::from(planned_minutes) * 60;
    let elapsed_secs = (now - start_time).num_seconds().max(0);
    planned_secs.saturating_sub(elapsed_secs).max(0) as u64
}
