//! Derived statistics over the session history.
//!
//! Recomputed from the full record set on every call; there is no
//! incremental maintenance, so cost is O(number of sessions).

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, Local, LocalResult, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{Session, SessionCategory, SessionStatus};

/// The original app counts weeks from Sunday.
pub const DEFAULT_WEEK_START: Weekday = Weekday::Sun;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: usize,
    /// Minutes across all completed sessions.
    pub total_time: u64,
    /// Always contains all four categories, zeroed when absent from the data.
    pub category_breakdown: BTreeMap<SessionCategory, u64>,
    /// Minutes since the most recent week boundary.
    pub weekly_time: u64,
    /// Minutes since the 1st of the current month.
    pub monthly_time: u64,
    pub avg_session_length: f64,
}

/// Compute statistics as of now, with the default week start.
pub fn session_stats(sessions: &[Session]) -> SessionStats {
    session_stats_at(sessions, Local::now(), DEFAULT_WEEK_START)
}

/// Compute statistics with an explicit reference time and week-start weekday.
///
/// Only `status = completed` sessions count. Week boundary is the most recent
/// occurrence of `week_start` at local midnight; month boundary is the 1st of
/// the current month at local midnight.
pub fn session_stats_at(
    sessions: &[Session],
    now: DateTime<Local>,
    week_start: Weekday,
) -> SessionStats {
    let completed: Vec<&Session> = sessions
        .iter()
        .filter(|session| session.status == SessionStatus::Completed)
        .collect();

    let today = now.date_naive();
    let week_boundary = local_midnight(today - Days::new(today.weekday().days_since(week_start) as u64));
    let month_boundary = local_midnight(today.with_day(1).unwrap_or(today));

    let minutes_of = |session: &Session| u64::from(session.actual_duration.unwrap_or(0));

    let total_time: u64 = completed.iter().map(|s| minutes_of(s)).sum();
    let weekly_time: u64 = completed
        .iter()
        .filter(|s| s.start_time >= week_boundary)
        .map(|s| minutes_of(s))
        .sum();
    let monthly_time: u64 = completed
        .iter()
        .filter(|s| s.start_time >= month_boundary)
        .map(|s| minutes_of(s))
        .sum();

    let mut category_breakdown: BTreeMap<SessionCategory, u64> = SessionCategory::ALL
        .iter()
        .map(|category| (*category, 0))
        .collect();
    for session in &completed {
        if let Some(total) = category_breakdown.get_mut(&session.category) {
            *total += minutes_of(session);
        }
    }

    let avg_session_length = if completed.is_empty() {
        0.0
    } else {
        total_time as f64 / completed.len() as f64
    };

    SessionStats {
        total_sessions: completed.len(),
        total_time,
        category_breakdown,
        weekly_time,
        monthly_time,
        avg_session_length,
    }
}

/// Local midnight of `date` as a UTC instant. Falls back to treating the
/// naive time as UTC when the local timezone skips midnight.
fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).expect("midnight is a valid time");
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn completed(category: SessionCategory, minutes: u32, start_time: DateTime<Utc>) -> Session {
        Session {
            id: uuid::Uuid::new_v4().to_string(),
            title: "test".to_string(),
            category,
            duration: minutes,
            actual_duration: Some(minutes),
            status: SessionStatus::Completed,
            start_time,
            end_time: Some(start_time + Duration::minutes(minutes as i64)),
            created_at: start_time,
        }
    }

    #[test]
    fn aggregates_totals_and_breakdown() {
        let now = Local::now();
        let sessions = vec![
            completed(SessionCategory::Study, 25, now.with_timezone(&Utc)),
            completed(SessionCategory::Work, 50, now.with_timezone(&Utc)),
        ];

        let stats = session_stats_at(&sessions, now, DEFAULT_WEEK_START);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_time, 75);
        assert_eq!(stats.weekly_time, 75);
        assert_eq!(stats.monthly_time, 75);
        assert_eq!(stats.avg_session_length, 37.5);
        assert_eq!(stats.category_breakdown[&SessionCategory::Study], 25);
        assert_eq!(stats.category_breakdown[&SessionCategory::Work], 50);
        assert_eq!(stats.category_breakdown[&SessionCategory::Fitness], 0);
        assert_eq!(stats.category_breakdown[&SessionCategory::Custom], 0);
    }

    #[test]
    fn only_completed_sessions_count() {
        let now = Local::now();
        let mut stopped = completed(SessionCategory::Study, 25, now.with_timezone(&Utc));
        stopped.status = SessionStatus::Stopped;
        stopped.actual_duration = Some(10);

        let stats = session_stats_at(&[stopped], now, DEFAULT_WEEK_START);
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.total_time, 0);
        assert_eq!(stats.avg_session_length, 0.0);
    }

    #[test]
    fn old_sessions_leave_weekly_and_monthly_windows() {
        let now = Local::now();
        let recent = completed(SessionCategory::Study, 30, now.with_timezone(&Utc));
        let ancient = completed(
            SessionCategory::Work,
            60,
            now.with_timezone(&Utc) - Duration::days(90),
        );

        let stats = session_stats_at(&[recent, ancient], now, DEFAULT_WEEK_START);
        assert_eq!(stats.total_time, 90);
        assert_eq!(stats.weekly_time, 30);
        assert_eq!(stats.monthly_time, 30);
    }

    #[test]
    fn empty_history_yields_zeroed_stats() {
        let stats = session_stats_at(&[], Local::now(), DEFAULT_WEEK_START);
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.avg_session_length, 0.0);
        assert_eq!(stats.category_breakdown.len(), 4);
    }
}
